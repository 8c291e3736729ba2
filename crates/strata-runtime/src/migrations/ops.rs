use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_core::error::Result;
use strata_core::schema::{AccessRules, CollectionDef, FieldDef, FieldPatch, SchemaRegistry};

/// A single schema edit, one variant per registry primitive.
///
/// Collection references accept either the collection id or its name; ids
/// are preferred since names may change over the life of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SchemaOp {
    CreateCollection {
        collection: CollectionDef,
    },
    DeleteCollection {
        collection: String,
    },
    AddField {
        collection: String,
        position: usize,
        field: FieldDef,
    },
    UpsertField {
        collection: String,
        position: usize,
        field: FieldDef,
    },
    RemoveField {
        collection: String,
        field_id: String,
    },
    MutateField {
        collection: String,
        field_id: String,
        patch: FieldPatch,
    },
    SetAccessRules {
        collection: String,
        rules: AccessRules,
    },
}

impl SchemaOp {
    /// Apply this edit to the registry.
    pub fn apply(&self, registry: &mut SchemaRegistry) -> Result<()> {
        match self {
            SchemaOp::CreateCollection { collection } => {
                registry.create_collection(collection.clone())
            }
            SchemaOp::DeleteCollection { collection } => {
                registry.delete_collection(collection).map(|_| ())
            }
            SchemaOp::AddField {
                collection,
                position,
                field,
            } => registry.add_field(collection, *position, field.clone()),
            SchemaOp::UpsertField {
                collection,
                position,
                field,
            } => registry.upsert_field(collection, *position, field.clone()),
            SchemaOp::RemoveField {
                collection,
                field_id,
            } => registry.remove_field(collection, field_id).map(|_| ()),
            SchemaOp::MutateField {
                collection,
                field_id,
                patch,
            } => registry.mutate_field(collection, field_id, patch),
            SchemaOp::SetAccessRules { collection, rules } => {
                registry.set_access_rules(collection, rules.clone())
            }
        }
    }

    /// Collection the edit targets, as written in the operation.
    pub fn collection(&self) -> &str {
        match self {
            SchemaOp::CreateCollection { collection } => &collection.id,
            SchemaOp::DeleteCollection { collection }
            | SchemaOp::AddField { collection, .. }
            | SchemaOp::UpsertField { collection, .. }
            | SchemaOp::RemoveField { collection, .. }
            | SchemaOp::MutateField { collection, .. }
            | SchemaOp::SetAccessRules { collection, .. } => collection,
        }
    }

    /// Short human-readable description for logs and plans.
    pub fn describe(&self) -> String {
        match self {
            SchemaOp::CreateCollection { collection } => {
                format!("create collection {}", collection.name)
            }
            SchemaOp::DeleteCollection { collection } => format!("delete collection {}", collection),
            SchemaOp::AddField {
                collection,
                position,
                field,
            } => format!("add field {} to {} at {}", field.name, collection, position),
            SchemaOp::UpsertField {
                collection,
                position,
                field,
            } => format!("update field {} in {} at {}", field.name, collection, position),
            SchemaOp::RemoveField {
                collection,
                field_id,
            } => format!("remove field {} from {}", field_id, collection),
            SchemaOp::MutateField {
                collection,
                field_id,
                ..
            } => format!("mutate field {} in {}", field_id, collection),
            SchemaOp::SetAccessRules { collection, .. } => {
                format!("set access rules on {}", collection)
            }
        }
    }
}

/// Apply a list of edits in order to an owned registry.
pub fn apply_ops(mut registry: SchemaRegistry, ops: &[SchemaOp]) -> Result<SchemaRegistry> {
    for op in ops {
        debug!("Applying step: {}", op.describe());
        op.apply(&mut registry)?;
    }
    Ok(registry)
}
