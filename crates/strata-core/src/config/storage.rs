use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where registry state and migration definitions live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the registry snapshot and applied migration ids.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Directory scanned for `*.json` migration files.
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// Whether the built-in migration catalogue is applied with directory migrations.
    #[serde(default = "default_true")]
    pub builtin_migrations: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            migrations_dir: default_migrations_dir(),
            builtin_migrations: true,
        }
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("pb_data/schema_state.json")
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("pb_migrations")
}

fn default_true() -> bool {
    true
}
