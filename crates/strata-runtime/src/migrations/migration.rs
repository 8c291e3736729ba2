use std::fmt;
use std::sync::Arc;

use strata_core::error::{Result, StrataError};
use strata_core::schema::SchemaRegistry;

use super::ops::{apply_ops, SchemaOp};

/// Pure registry transformation used by programmatic migrations.
pub type TransformFn = Arc<dyn Fn(SchemaRegistry) -> Result<SchemaRegistry> + Send + Sync>;

/// One direction of a migration.
#[derive(Clone)]
pub enum Transform {
    /// Declarative edits, as loaded from migration files.
    Steps(Vec<SchemaOp>),
    /// Arbitrary registry-to-registry function.
    Func(TransformFn),
}

impl Transform {
    /// Apply the transformation to an owned registry value.
    pub fn apply(&self, registry: SchemaRegistry) -> Result<SchemaRegistry> {
        match self {
            Transform::Steps(ops) => apply_ops(registry, ops),
            Transform::Func(f) => f(registry),
        }
    }

    /// Declarative steps, if this is not a function transform.
    pub fn steps(&self) -> Option<&[SchemaOp]> {
        match self {
            Transform::Steps(ops) => Some(ops),
            Transform::Func(_) => None,
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Steps(ops) => f.debug_tuple("Steps").field(ops).finish(),
            Transform::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// A single reversible migration.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique identifier of the form `<timestamp>_<description>`
    /// (e.g. "1769415721_updated_inventory").
    pub id: String,
    /// Forward transformation.
    pub up: Transform,
    /// Exact inverse of `up`.
    pub down: Transform,
}

impl Migration {
    /// Migration made of declarative steps.
    pub fn new(id: impl Into<String>, up: Vec<SchemaOp>, down: Vec<SchemaOp>) -> Self {
        Self {
            id: id.into(),
            up: Transform::Steps(up),
            down: Transform::Steps(down),
        }
    }

    /// Migration made of two registry functions.
    pub fn from_fn<U, D>(id: impl Into<String>, up: U, down: D) -> Self
    where
        U: Fn(SchemaRegistry) -> Result<SchemaRegistry> + Send + Sync + 'static,
        D: Fn(SchemaRegistry) -> Result<SchemaRegistry> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            up: Transform::Func(Arc::new(up)),
            down: Transform::Func(Arc::new(down)),
        }
    }

    /// Numeric ordering key taken from the id prefix.
    pub fn timestamp(&self) -> Result<u64> {
        parse_migration_id(&self.id).map(|(ts, _)| ts)
    }

    /// Descriptive part of the id.
    pub fn description(&self) -> &str {
        self.id.split_once('_').map(|(_, d)| d).unwrap_or("")
    }

    /// Run `up`, tagging any failure with this migration's id.
    pub fn apply_up(&self, registry: SchemaRegistry) -> Result<SchemaRegistry> {
        self.up
            .apply(registry)
            .map_err(|e| StrataError::transformation(&self.id, e))
    }

    /// Run `down`, tagging any failure with this migration's id.
    pub fn apply_down(&self, registry: SchemaRegistry) -> Result<SchemaRegistry> {
        self.down
            .apply(registry)
            .map_err(|e| StrataError::transformation(&self.id, e))
    }
}

/// Split `<timestamp>_<description>` into its parts.
pub fn parse_migration_id(id: &str) -> Result<(u64, &str)> {
    let invalid = || {
        StrataError::InvalidMigration(format!(
            "'{}' is not of the form <timestamp>_<description>",
            id
        ))
    };

    let (timestamp, description) = id.split_once('_').ok_or_else(invalid)?;
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if description.is_empty()
        || !description
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid());
    }

    let timestamp = timestamp.parse::<u64>().map_err(|_| invalid())?;
    Ok((timestamp, description))
}

/// Validate ids and return the migrations in ascending timestamp order.
///
/// Duplicate ids or timestamps are rejected rather than ordered arbitrarily.
pub fn order_migrations(migrations: &[Migration]) -> Result<Vec<&Migration>> {
    let mut keyed = Vec::with_capacity(migrations.len());
    for migration in migrations {
        let (timestamp, _) = parse_migration_id(&migration.id)?;
        keyed.push((timestamp, migration));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

    for pair in keyed.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(StrataError::Conflict(format!(
                "migrations '{}' and '{}' share timestamp {}",
                pair[0].1.id, pair[1].1.id, pair[0].0
            )));
        }
    }

    Ok(keyed.into_iter().map(|(_, m)| m).collect())
}
