use serde::{Deserialize, Serialize};

use super::types::FieldOptions;

/// Definition of a collection field.
///
/// The `id` is the field's identity and never changes; `name` is what humans
/// and the record API see and may be renamed freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Stable field id (e.g. "number482839832").
    pub id: String,

    /// Display/API name.
    pub name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default)]
    pub presentable: bool,

    /// Managed by the platform itself.
    #[serde(default)]
    pub system: bool,

    /// Field type and type-specific constraints.
    #[serde(flatten)]
    pub options: FieldOptions,
}

impl FieldDef {
    /// Create a new non-system field with all flags cleared.
    pub fn new(id: impl Into<String>, name: impl Into<String>, options: FieldOptions) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            required: false,
            hidden: false,
            presentable: false,
            system: false,
            options,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    /// Type name of the field ("text", "relation", ...).
    pub fn type_name(&self) -> &'static str {
        self.options.type_name()
    }

    /// Relation target and cascade policy, if this is a relation field.
    pub fn relation(&self) -> Option<(&str, bool)> {
        match &self.options {
            FieldOptions::Relation(rel) => Some((rel.collection_id.as_str(), rel.cascade_delete)),
            _ => None,
        }
    }
}

/// Partial update applied by `SchemaRegistry::mutate_field`.
///
/// Absent attributes are left as they are. The field id can never be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentable: Option<bool>,

    /// Replacement type and constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<FieldOptions>,

    /// New slot in the collection's field list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl FieldPatch {
    /// Patch that only renames the field.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Patch that only replaces the type options.
    pub fn options(options: FieldOptions) -> Self {
        Self {
            options: Some(options),
            ..Default::default()
        }
    }

    /// Apply every attribute except `position` to `field`.
    pub fn apply_to(&self, field: &mut FieldDef) {
        if let Some(ref name) = self.name {
            field.name = name.clone();
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(hidden) = self.hidden {
            field.hidden = hidden;
        }
        if let Some(presentable) = self.presentable {
            field.presentable = presentable;
        }
        if let Some(ref options) = self.options {
            field.options = options.clone();
        }
    }

    /// Patch that reverts `field` to its current state, for building `down` steps.
    pub fn inverse_of(field: &FieldDef, position: usize) -> Self {
        Self {
            name: Some(field.name.clone()),
            required: Some(field.required),
            hidden: Some(field.hidden),
            presentable: Some(field.presentable),
            options: Some(field.options.clone()),
            position: Some(position),
        }
    }
}
