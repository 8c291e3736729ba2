mod builtin;
mod loader;
mod migration;
mod ops;
mod runner;

pub use builtin::{baseline_registry, get_builtin_migrations};
pub use loader::{load_migrations_from_dir, parse_migration, MigrationFile};
pub use migration::{order_migrations, parse_migration_id, Migration, Transform, TransformFn};
pub use ops::{apply_ops, SchemaOp};
pub use runner::{AppliedStatus, MigrationPlan, MigrationRunner, MigrationStatus};
