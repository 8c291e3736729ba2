//! Migration runner with whole-batch locking.
//!
//! Applies migrations in timestamp order against the stored registry and
//! reverts them in the opposite order. Each migration runs on a working copy
//! of the registry and is persisted on its own, so a failure aborts the batch
//! while everything applied before it stays applied.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use strata_core::error::{Result, StrataError};
use strata_core::schema::SchemaRegistry;

use super::migration::{order_migrations, parse_migration_id, Migration};
use crate::store::{MigrationState, StateStore};

/// Migration runner over a state store.
pub struct MigrationRunner<S: StateStore> {
    store: S,
    /// Registry used when the store holds no state yet.
    baseline: SchemaRegistry,
    /// Held for the duration of every batch.
    lock: Mutex<()>,
}

impl<S: StateStore> MigrationRunner<S> {
    pub fn new(store: S, baseline: SchemaRegistry) -> Self {
        Self {
            store,
            baseline,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current persisted state, or the baseline if nothing was saved yet.
    pub async fn state(&self) -> Result<MigrationState> {
        let _guard = self.lock.lock().await;
        self.load_state().await
    }

    /// Current registry.
    pub async fn registry(&self) -> Result<SchemaRegistry> {
        Ok(self.state().await?.registry)
    }

    /// Apply every pending migration in ascending timestamp order.
    ///
    /// Returns the ids applied by this call.
    pub async fn apply_forward(&self, migrations: &[Migration]) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;

        let ordered = order_migrations(migrations)?;
        let mut state = self.load_state().await?;
        let pending = pending_in_order(&state, &ordered)?;
        debug!("Pending migrations: {:?}", pending.iter().map(|m| &m.id).collect::<Vec<_>>());

        let mut applied = Vec::with_capacity(pending.len());
        for migration in pending {
            info!("Applying migration: {}", migration.id);
            let start = Instant::now();

            let registry = migration
                .apply_up(state.registry.clone())
                .inspect_err(|e| warn!("Aborting batch: {}: {}", e, e.root_cause()))?;

            state.registry = registry;
            state.record(&migration.id, start.elapsed().as_millis() as u64);
            self.store.save(&state).await?;

            info!("Migration applied: {}", migration.id);
            applied.push(migration.id.clone());
        }

        Ok(applied)
    }

    /// Revert every applied migration in descending timestamp order.
    ///
    /// Returns the ids reverted by this call.
    pub async fn apply_backward(&self, migrations: &[Migration]) -> Result<Vec<String>> {
        self.revert(migrations, usize::MAX).await
    }

    /// Revert the last `count` applied migrations.
    pub async fn rollback(&self, migrations: &[Migration], count: usize) -> Result<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        self.revert(migrations, count).await
    }

    /// Applied and pending migrations.
    pub async fn status(&self, migrations: &[Migration]) -> Result<MigrationStatus> {
        let _guard = self.lock.lock().await;

        let ordered = order_migrations(migrations)?;
        let state = self.load_state().await?;

        let applied = state
            .applied
            .iter()
            .map(|m| AppliedStatus {
                id: m.id.clone(),
                applied_at: m.applied_at,
                has_definition: ordered.iter().any(|d| d.id == m.id),
            })
            .collect();
        let pending = ordered
            .iter()
            .filter(|m| !state.is_applied(&m.id))
            .map(|m| m.id.clone())
            .collect();

        Ok(MigrationStatus { applied, pending })
    }

    /// Simulate `apply_forward` without persisting anything.
    pub async fn plan(&self, migrations: &[Migration]) -> Result<MigrationPlan> {
        let _guard = self.lock.lock().await;

        let ordered = order_migrations(migrations)?;
        let state = self.load_state().await?;
        let pending = pending_in_order(&state, &ordered)?;

        let mut registry = state.registry;
        let mut ids = Vec::with_capacity(pending.len());
        for migration in pending {
            registry = migration.apply_up(registry)?;
            ids.push(migration.id.clone());
        }

        Ok(MigrationPlan {
            pending: ids,
            registry,
        })
    }

    async fn revert(&self, migrations: &[Migration], limit: usize) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;

        let by_id: HashMap<&str, &Migration> = order_migrations(migrations)?
            .into_iter()
            .map(|m| (m.id.as_str(), m))
            .collect();
        let mut state = self.load_state().await?;

        let mut targets = Vec::with_capacity(state.applied.len());
        for applied in &state.applied {
            let (timestamp, _) = parse_migration_id(&applied.id)?;
            targets.push((timestamp, applied.id.clone()));
        }
        targets.sort_by(|a, b| b.0.cmp(&a.0));
        targets.truncate(limit);

        let mut reverted = Vec::with_capacity(targets.len());
        for (_, id) in targets {
            let migration = by_id.get(id.as_str()).ok_or_else(|| {
                StrataError::NotFound(format!("definition of applied migration '{}'", id))
            })?;
            info!("Reverting migration: {}", id);

            let registry = migration
                .apply_down(state.registry.clone())
                .inspect_err(|e| warn!("Aborting batch: {}: {}", e, e.root_cause()))?;

            state.registry = registry;
            state.unrecord(&id);
            self.store.save(&state).await?;

            info!("Migration reverted: {}", id);
            reverted.push(id);
        }

        Ok(reverted)
    }

    async fn load_state(&self) -> Result<MigrationState> {
        match self.store.load().await? {
            Some(state) => {
                debug!("Already applied migrations: {}", state.applied.len());
                Ok(state)
            }
            None => {
                debug!("No stored state, starting from baseline");
                Ok(MigrationState::new(self.baseline.clone()))
            }
        }
    }
}

/// Pending migrations, refusing any that sort before the newest applied one.
///
/// Position-based field inserts only land on the intended slot when
/// migrations run in order, so a late arrival must be rolled in by hand.
fn pending_in_order<'a>(
    state: &MigrationState,
    ordered: &[&'a Migration],
) -> Result<Vec<&'a Migration>> {
    let mut newest_applied = None;
    for applied in &state.applied {
        let (timestamp, _) = parse_migration_id(&applied.id)?;
        newest_applied = newest_applied.max(Some(timestamp));
    }

    let mut pending = Vec::new();
    for migration in ordered.iter().copied() {
        if state.is_applied(&migration.id) {
            continue;
        }
        if let Some(newest) = newest_applied {
            let (timestamp, _) = parse_migration_id(&migration.id)?;
            if timestamp < newest {
                return Err(StrataError::InvalidMigration(format!(
                    "'{}' is older than the newest applied migration; roll back to before it first",
                    migration.id
                )));
            }
        }
        pending.push(migration);
    }

    Ok(pending)
}

/// Result of `MigrationRunner::status`.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Applied migrations in application order.
    pub applied: Vec<AppliedStatus>,
    /// Known but not applied migrations in timestamp order.
    pub pending: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppliedStatus {
    pub id: String,
    pub applied_at: DateTime<Utc>,
    /// Whether a definition (and so a `down`) was supplied for it.
    pub has_definition: bool,
}

/// Result of `MigrationRunner::plan`.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Ids that would be applied, in order.
    pub pending: Vec<String>,
    /// Registry after applying them.
    pub registry: SchemaRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::SchemaOp;
    use crate::store::MemoryStore;
    use strata_core::schema::{CollectionDef, FieldDef, FieldOptions, FieldPatch};
    use strata_core::{assert_err_variant, assert_fields};

    const INVENTORY: &str = "pbc_3573984430";

    fn baseline() -> SchemaRegistry {
        SchemaRegistry::from_collections([CollectionDef::new(INVENTORY, "inventory")
            .with_field(FieldDef::new("text3208210256", "id", FieldOptions::text()).system())
            .with_field(FieldDef::new("number482839832", "concentration", FieldOptions::number()))
            .with_field(FieldDef::new("number3113930206", "volume", FieldOptions::number()))])
        .unwrap()
    }

    fn add_rack(id: &str) -> Migration {
        Migration::new(
            id,
            vec![SchemaOp::AddField {
                collection: INVENTORY.into(),
                position: 1,
                field: FieldDef::new("text2391188286", "rack_id", FieldOptions::text()),
            }],
            vec![SchemaOp::RemoveField {
                collection: INVENTORY.into(),
                field_id: "text2391188286".into(),
            }],
        )
    }

    fn rename(id: &str, field_id: &str, from: &str, to: &str) -> Migration {
        Migration::new(
            id,
            vec![SchemaOp::MutateField {
                collection: INVENTORY.into(),
                field_id: field_id.into(),
                patch: FieldPatch::rename(to),
            }],
            vec![SchemaOp::MutateField {
                collection: INVENTORY.into(),
                field_id: field_id.into(),
                patch: FieldPatch::rename(from),
            }],
        )
    }

    fn runner() -> MigrationRunner<MemoryStore> {
        MigrationRunner::new(MemoryStore::new(), baseline())
    }

    #[tokio::test]
    async fn test_forward_applies_in_timestamp_order() {
        let runner = runner();
        let migrations = vec![
            rename("20_rename_conc", "number482839832", "concentration", "conc_mgml"),
            add_rack("10_add_rack"),
        ];

        let applied = runner.apply_forward(&migrations).await.unwrap();
        assert_eq!(applied, vec!["10_add_rack", "20_rename_conc"]);

        let registry = runner.registry().await.unwrap();
        assert_fields!(registry, "inventory", ["id", "rack_id", "conc_mgml", "volume"]);
    }

    #[tokio::test]
    async fn test_forward_is_idempotent() {
        let runner = runner();
        let migrations = vec![add_rack("10_add_rack")];

        runner.apply_forward(&migrations).await.unwrap();
        let second = runner.apply_forward(&migrations).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_migrations_applied() {
        let runner = runner();
        let migrations = vec![
            add_rack("10_add_rack"),
            rename("20_rename_missing", "number404", "a", "b"),
            rename("30_rename_volume", "number3113930206", "volume", "vol_ul"),
        ];

        let err = runner.apply_forward(&migrations).await.unwrap_err();
        match &err {
            StrataError::Transformation { migration, source } => {
                assert_eq!(migration, "20_rename_missing");
                assert!(matches!(**source, StrataError::NotFound(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let state = runner.state().await.unwrap();
        assert!(state.is_applied("10_add_rack"));
        assert!(!state.is_applied("20_rename_missing"));
        assert!(!state.is_applied("30_rename_volume"));
        assert_fields!(state.registry, "inventory", ["id", "rack_id", "concentration", "volume"]);
    }

    #[tokio::test]
    async fn test_failed_migration_is_atomic() {
        let runner = runner();
        let partial = Migration::new(
            "10_partial",
            vec![
                SchemaOp::MutateField {
                    collection: INVENTORY.into(),
                    field_id: "number482839832".into(),
                    patch: FieldPatch::rename("conc_mgml"),
                },
                SchemaOp::RemoveField {
                    collection: INVENTORY.into(),
                    field_id: "number404".into(),
                },
            ],
            vec![],
        );

        assert!(runner.apply_forward(&[partial]).await.is_err());
        assert_eq!(runner.registry().await.unwrap(), baseline());
        assert!(runner.store().snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_forward_then_backward_restores_baseline() {
        let runner = runner();
        let migrations = vec![
            add_rack("10_add_rack"),
            rename("20_rename_conc", "number482839832", "concentration", "conc_mgml"),
            rename("30_rename_volume", "number3113930206", "volume", "vol_ul"),
        ];

        runner.apply_forward(&migrations).await.unwrap();
        let reverted = runner.apply_backward(&migrations).await.unwrap();
        assert_eq!(reverted, vec!["30_rename_volume", "20_rename_conc", "10_add_rack"]);

        let state = runner.state().await.unwrap();
        assert!(state.applied.is_empty());
        assert_eq!(state.registry, baseline());
    }

    #[tokio::test]
    async fn test_rollback_count() {
        let runner = runner();
        let migrations = vec![
            add_rack("10_add_rack"),
            rename("20_rename_conc", "number482839832", "concentration", "conc_mgml"),
        ];
        runner.apply_forward(&migrations).await.unwrap();

        assert!(runner.rollback(&migrations, 0).await.unwrap().is_empty());
        let reverted = runner.rollback(&migrations, 1).await.unwrap();
        assert_eq!(reverted, vec!["20_rename_conc"]);

        let state = runner.state().await.unwrap();
        assert!(state.is_applied("10_add_rack"));
        assert_fields!(state.registry, "inventory", ["id", "rack_id", "concentration", "volume"]);
    }

    #[tokio::test]
    async fn test_backward_requires_definitions() {
        let runner = runner();
        runner.apply_forward(&[add_rack("10_add_rack")]).await.unwrap();

        let result = runner.apply_backward(&[]).await;
        assert_err_variant!(result, StrataError::NotFound(_));
        assert!(runner.state().await.unwrap().is_applied("10_add_rack"));
    }

    #[tokio::test]
    async fn test_out_of_order_migration_refused() {
        let runner = runner();
        runner
            .apply_forward(&[rename("20_rename_conc", "number482839832", "concentration", "conc_mgml")])
            .await
            .unwrap();

        let late = vec![
            add_rack("10_add_rack"),
            rename("20_rename_conc", "number482839832", "concentration", "conc_mgml"),
        ];
        assert_err_variant!(runner.apply_forward(&late).await, StrataError::InvalidMigration(_));
    }

    #[tokio::test]
    async fn test_status() {
        let runner = runner();
        let migrations = vec![
            add_rack("10_add_rack"),
            rename("20_rename_conc", "number482839832", "concentration", "conc_mgml"),
        ];
        runner.apply_forward(&migrations[..1]).await.unwrap();

        let status = runner.status(&migrations).await.unwrap();
        assert_eq!(status.applied.len(), 1);
        assert_eq!(status.applied[0].id, "10_add_rack");
        assert!(status.applied[0].has_definition);
        assert_eq!(status.pending, vec!["20_rename_conc"]);
    }

    #[tokio::test]
    async fn test_status_flags_applied_without_definition() {
        let mut state = MigrationState::new(baseline());
        state.record("5_dropped_field", 1);
        let runner = MigrationRunner::new(MemoryStore::with_state(state), baseline());

        let status = runner.status(&[add_rack("10_add_rack")]).await.unwrap();
        assert_eq!(status.applied.len(), 1);
        assert_eq!(status.applied[0].id, "5_dropped_field");
        assert!(!status.applied[0].has_definition);
        assert_eq!(status.pending, vec!["10_add_rack"]);
    }

    #[tokio::test]
    async fn test_plan_does_not_persist() {
        let runner = runner();
        let migrations = vec![add_rack("10_add_rack")];

        let plan = runner.plan(&migrations).await.unwrap();
        assert_eq!(plan.pending, vec!["10_add_rack"]);
        assert_fields!(plan.registry, "inventory", ["id", "rack_id", "concentration", "volume"]);

        assert!(runner.store().snapshot().await.is_none());
        assert_eq!(runner.registry().await.unwrap(), baseline());
    }

    #[tokio::test]
    async fn test_duplicate_timestamps_rejected_before_running() {
        let runner = runner();
        let migrations = vec![add_rack("10_add_rack"), rename("10_other", "number482839832", "concentration", "c")];
        assert_err_variant!(runner.apply_forward(&migrations).await, StrataError::Conflict(_));
        assert!(runner.store().snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_batches_serialise() {
        let runner = runner();
        let migrations = vec![
            add_rack("10_add_rack"),
            rename("20_rename_conc", "number482839832", "concentration", "conc_mgml"),
        ];

        let (first, second) = tokio::join!(
            runner.apply_forward(&migrations),
            runner.apply_forward(&migrations)
        );
        let mut applied = first.unwrap();
        applied.extend(second.unwrap());
        applied.sort();
        assert_eq!(applied, vec!["10_add_rack", "20_rename_conc"]);
        assert_eq!(runner.state().await.unwrap().applied.len(), 2);
    }
}
