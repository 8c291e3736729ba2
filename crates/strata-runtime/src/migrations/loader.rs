use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_core::error::{Result, StrataError};

use super::migration::{parse_migration_id, Migration};
use super::ops::SchemaOp;

/// On-disk shape of a migration file. Both directions must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationFile {
    pub up: Vec<SchemaOp>,
    pub down: Vec<SchemaOp>,
}

/// Parse the JSON body of a migration file.
pub fn parse_migration(id: &str, content: &str) -> Result<Migration> {
    parse_migration_id(id)?;

    let file: MigrationFile = serde_json::from_str(content).map_err(|e| {
        StrataError::InvalidMigration(format!("Failed to parse migration '{}': {}", id, e))
    })?;

    if !file.up.is_empty() && file.down.is_empty() {
        return Err(StrataError::InvalidMigration(format!(
            "Migration '{}' has no down steps to reverse its up steps",
            id
        )));
    }

    Ok(Migration::new(id, file.up, file.down))
}

/// Load user migrations from a directory.
///
/// Migrations should be named like:
/// - `1769415721_updated_inventory.json`
/// - `1769431004_updated_logs.json`
///
/// They are sorted by timestamp prefix and executed in order.
pub fn load_migrations_from_dir(dir: &Path) -> Result<Vec<Migration>> {
    if !dir.exists() {
        debug!("Migrations directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut migrations = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().map(|e| e == "json").unwrap_or(false) {
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| StrataError::InvalidMigration("Invalid migration filename".into()))?
                .to_string();

            let content = std::fs::read_to_string(&path)?;
            migrations.push(parse_migration(&id, &content)?);
        }
    }

    migrations.sort_by_key(|m| (m.timestamp().unwrap_or(u64::MAX), m.id.clone()));

    debug!("Loaded {} migrations from {:?}", migrations.len(), dir);
    Ok(migrations)
}
