//! Built-in lab schema migrations.
//!
//! The schema history of the lab collections (`experiments`, `inventory`,
//! `logs`, `animals`, `immunization_logs`), embedded from the migrations
//! directory together with the baseline those migrations start from.

use strata_core::error::Result;
use strata_core::schema::SchemaRegistry;

use super::loader::parse_migration;
use super::migration::Migration;

/// Registry state before the first built-in migration.
const BASELINE_JSON: &str = include_str!("../../migrations/baseline.json");

/// Migration files, in timestamp order.
const BUILTIN_MIGRATIONS: &[(&str, &str)] = &[
    (
        "1769163921_updated_experiments",
        include_str!("../../migrations/1769163921_updated_experiments.json"),
    ),
    (
        "1769260389_updated_inventory",
        include_str!("../../migrations/1769260389_updated_inventory.json"),
    ),
    (
        "1769415721_updated_inventory",
        include_str!("../../migrations/1769415721_updated_inventory.json"),
    ),
    (
        "1769431004_updated_logs",
        include_str!("../../migrations/1769431004_updated_logs.json"),
    ),
    (
        "1769515219_updated_experiments",
        include_str!("../../migrations/1769515219_updated_experiments.json"),
    ),
    (
        "1769522283_created_animals",
        include_str!("../../migrations/1769522283_created_animals.json"),
    ),
    (
        "1769522450_created_immunization_logs",
        include_str!("../../migrations/1769522450_created_immunization_logs.json"),
    ),
    (
        "1769535644_updated_immunization_logs",
        include_str!("../../migrations/1769535644_updated_immunization_logs.json"),
    ),
    (
        "1769583998_updated_immunization_logs",
        include_str!("../../migrations/1769583998_updated_immunization_logs.json"),
    ),
    (
        "1769584940_updated_immunization_logs",
        include_str!("../../migrations/1769584940_updated_immunization_logs.json"),
    ),
    (
        "1769585003_updated_immunization_logs",
        include_str!("../../migrations/1769585003_updated_immunization_logs.json"),
    ),
    (
        "1769587033_updated_experiments",
        include_str!("../../migrations/1769587033_updated_experiments.json"),
    ),
    (
        "1769587649_updated_inventory",
        include_str!("../../migrations/1769587649_updated_inventory.json"),
    ),
];

/// Get all built-in migrations.
///
/// These are applied in order before any directory migrations.
pub fn get_builtin_migrations() -> Result<Vec<Migration>> {
    BUILTIN_MIGRATIONS
        .iter()
        .map(|(id, json)| parse_migration(id, json))
        .collect()
}

/// Registry the built-in migrations were written against.
pub fn baseline_registry() -> Result<SchemaRegistry> {
    Ok(serde_json::from_str(BASELINE_JSON)?)
}
