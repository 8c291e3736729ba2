//! Durable storage for registry state and applied migration ids.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use strata_core::error::{Result, StrataError};
use strata_core::schema::SchemaRegistry;

/// A migration that has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub id: String,
    pub applied_at: DateTime<Utc>,
    pub execution_time_ms: u64,
}

/// Everything the sequencer persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationState {
    /// Current registry.
    pub registry: SchemaRegistry,
    /// Applied migrations in application order.
    #[serde(default)]
    pub applied: Vec<AppliedMigration>,
}

impl MigrationState {
    /// Fresh state with nothing applied.
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            applied: Vec::new(),
        }
    }

    pub fn is_applied(&self, id: &str) -> bool {
        self.applied.iter().any(|m| m.id == id)
    }

    /// Most recently applied migration.
    pub fn last_applied(&self) -> Option<&AppliedMigration> {
        self.applied.last()
    }

    /// Mark a migration as applied now.
    pub fn record(&mut self, id: impl Into<String>, execution_time_ms: u64) {
        self.applied.push(AppliedMigration {
            id: id.into(),
            applied_at: Utc::now(),
            execution_time_ms,
        });
    }

    /// Unmark a migration; returns whether it was applied.
    pub fn unrecord(&mut self, id: &str) -> bool {
        let before = self.applied.len();
        self.applied.retain(|m| m.id != id);
        self.applied.len() != before
    }
}

/// Persistence backend for `MigrationState`.
pub trait StateStore: Send + Sync {
    /// Load the stored state, `None` if nothing has been saved yet.
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<MigrationState>>> + Send + '_>>;

    /// Replace the stored state.
    fn save<'a>(
        &'a self,
        state: &'a MigrationState,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Pretty-printed JSON file.
///
/// Saves write a sibling temp file and rename it over the target, so readers
/// never observe a partially written state.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load_inner(&self) -> Result<Option<MigrationState>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("State file does not exist: {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(StrataError::Io(e)),
        };

        let state = serde_json::from_str(&content).map_err(|e| {
            StrataError::Serialization(format!(
                "Failed to parse state file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(state))
    }

    async fn save_inner(&self, state: &MigrationState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut content = serde_json::to_string_pretty(state)?;
        content.push('\n');

        let temp = self.temp_path();
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!("Saved state to {:?}", self.path);
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<MigrationState>>> + Send + '_>> {
        Box::pin(self.load_inner())
    }

    fn save<'a>(
        &'a self,
        state: &'a MigrationState,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.save_inner(state))
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<MigrationState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `state`.
    pub fn with_state(state: MigrationState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Copy of the currently stored state.
    pub async fn snapshot(&self) -> Option<MigrationState> {
        self.state.lock().await.clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<MigrationState>>> + Send + '_>> {
        Box::pin(async move { Ok(self.state.lock().await.clone()) })
    }

    fn save<'a>(
        &'a self,
        state: &'a MigrationState,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            *self.state.lock().await = Some(state.clone());
            Ok(())
        })
    }
}
