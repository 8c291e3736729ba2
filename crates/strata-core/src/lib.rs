pub mod config;
pub mod error;
pub mod schema;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::StrataConfig;
pub use error::{Result, StrataError};
pub use schema::{
    AccessRules, CollectionDef, CollectionType, FieldDef, FieldOptions, FieldPatch, SchemaRegistry,
};
