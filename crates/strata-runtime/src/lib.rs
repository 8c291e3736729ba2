pub mod migrations;
pub mod store;

pub use migrations::{
    baseline_registry, get_builtin_migrations, load_migrations_from_dir, Migration,
    MigrationRunner, SchemaOp,
};
pub use store::{AppliedMigration, JsonFileStore, MemoryStore, MigrationState, StateStore};
