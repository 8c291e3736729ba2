use serde::{Deserialize, Serialize};

use super::field::FieldDef;

/// Kind of collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    #[default]
    Base,
    Auth,
    View,
}

/// Access-rule predicates of a collection.
///
/// `None` leaves the operation unrestricted by rule; `Some` holds a boolean
/// filter expression that the platform evaluates. Expressions are stored
/// verbatim, including any trailing whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessRules {
    pub list_rule: Option<String>,
    pub view_rule: Option<String>,
    pub create_rule: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
}

impl AccessRules {
    /// Rules with every operation unrestricted.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Same expression for all five operations.
    pub fn all(rule: impl Into<String>) -> Self {
        let rule = rule.into();
        Self {
            list_rule: Some(rule.clone()),
            view_rule: Some(rule.clone()),
            create_rule: Some(rule.clone()),
            update_rule: Some(rule.clone()),
            delete_rule: Some(rule),
        }
    }
}

/// Definition of a collection: a named, uniquely identified, ordered list of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDef {
    /// Stable collection id (e.g. "pbc_3573984430").
    pub id: String,

    /// Collection name, unique across the registry.
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: CollectionType,

    #[serde(flatten)]
    pub rules: AccessRules,

    /// Fields in display order.
    #[serde(default)]
    pub fields: Vec<FieldDef>,

    /// Raw index definitions.
    #[serde(default)]
    pub indexes: Vec<String>,

    #[serde(default)]
    pub system: bool,
}

impl CollectionDef {
    /// Create an empty base collection with unrestricted rules.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: CollectionType::Base,
            rules: AccessRules::unrestricted(),
            fields: Vec::new(),
            indexes: Vec::new(),
            system: false,
        }
    }

    /// Append a field, builder style.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_rules(mut self, rules: AccessRules) -> Self {
        self.rules = rules;
        self
    }

    /// Look up a field by its stable id.
    pub fn field(&self, id: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Look up a field by its current name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Current slot of the field with the given id.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    /// Field names in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Relation fields pointing at `collection_id`.
    ///
    /// The iterator borrows only from the collection, not from `collection_id`.
    pub fn relations_to(&self, collection_id: &str) -> impl Iterator<Item = &FieldDef> + '_ {
        let collection_id = collection_id.to_owned();
        self.fields
            .iter()
            .filter(move |f| matches!(f.relation(), Some((target, _)) if target == collection_id))
    }
}
