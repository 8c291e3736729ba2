//! Testing utilities for Strata.
//!
//! Assertion macros for registry primitives and migration batches. Enabled
//! for this crate's own tests and for dependents through the `testing` feature.
//!
//! # Example
//!
//! ```ignore
//! use strata_core::{assert_err_variant, assert_fields};
//!
//! assert_fields!(registry, "inventory", ["id", "rack_id", "conc_mgml"]);
//! assert_err_variant!(registry.remove_field("inventory", "nope"), StrataError::NotFound(_));
//! ```

pub mod assertions;

pub use assertions::*;
