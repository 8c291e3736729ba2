use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::collection::{AccessRules, CollectionDef};
use super::field::{FieldDef, FieldPatch};
use crate::error::{Result, StrataError};

/// Registry of all collections, keyed by stable id.
///
/// Names form a secondary index that is rebuilt whenever a collection is
/// created, replaced or deleted. Every primitive validates the complete
/// result before storing it, so a failed call leaves the registry untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegistrySnapshot", into = "RegistrySnapshot")]
pub struct SchemaRegistry {
    /// All collections by id.
    collections: BTreeMap<String, CollectionDef>,

    /// Collection id by name.
    names: HashMap<String, String>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry by creating the given collections in order.
    pub fn from_collections(collections: impl IntoIterator<Item = CollectionDef>) -> Result<Self> {
        let mut registry = Self::new();
        for collection in collections {
            registry.create_collection(collection)?;
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// All collections, ordered by id.
    pub fn collections(&self) -> impl Iterator<Item = &CollectionDef> {
        self.collections.values()
    }

    /// Get a collection by id.
    pub fn collection(&self, id: &str) -> Option<&CollectionDef> {
        self.collections.get(id)
    }

    /// Get a collection by name.
    pub fn collection_by_name(&self, name: &str) -> Option<&CollectionDef> {
        self.names.get(name).and_then(|id| self.collections.get(id))
    }

    /// Find a collection by id, falling back to name.
    pub fn find_collection(&self, id_or_name: &str) -> Result<&CollectionDef> {
        self.collection(id_or_name)
            .or_else(|| self.collection_by_name(id_or_name))
            .ok_or_else(|| StrataError::NotFound(format!("collection '{}'", id_or_name)))
    }

    /// Create a new collection.
    pub fn create_collection(&mut self, collection: CollectionDef) -> Result<()> {
        if collection.id.is_empty() || collection.name.is_empty() {
            return Err(StrataError::ConstraintViolation(
                "collection id and name must not be empty".into(),
            ));
        }
        if self.collections.contains_key(&collection.id) {
            return Err(StrataError::Conflict(format!(
                "collection id '{}' already exists",
                collection.id
            )));
        }
        if self.names.contains_key(&collection.name) {
            return Err(StrataError::Conflict(format!(
                "collection name '{}' already exists",
                collection.name
            )));
        }
        self.validate_fields(&collection)?;

        self.names.insert(collection.name.clone(), collection.id.clone());
        self.collections.insert(collection.id.clone(), collection);
        Ok(())
    }

    /// Replace an existing collection with a new definition of the same id.
    pub fn save_collection(&mut self, collection: CollectionDef) -> Result<()> {
        let previous_name = match self.collections.get(&collection.id) {
            Some(existing) => existing.name.clone(),
            None => {
                return Err(StrataError::NotFound(format!(
                    "collection '{}'",
                    collection.id
                )))
            }
        };
        if collection.name.is_empty() {
            return Err(StrataError::ConstraintViolation(
                "collection name must not be empty".into(),
            ));
        }
        if let Some(owner) = self.names.get(&collection.name) {
            if owner != &collection.id {
                return Err(StrataError::Conflict(format!(
                    "collection name '{}' already exists",
                    collection.name
                )));
            }
        }
        self.validate_fields(&collection)?;

        self.names.remove(&previous_name);
        self.names.insert(collection.name.clone(), collection.id.clone());
        self.collections.insert(collection.id.clone(), collection);
        Ok(())
    }

    /// Delete a collection by id or name and return its definition.
    ///
    /// Refused while another collection holds a non-cascading relation to it.
    /// Cascading relation fields are removed together with the collection.
    pub fn delete_collection(&mut self, id_or_name: &str) -> Result<CollectionDef> {
        let id = self.find_collection(id_or_name)?.id.clone();

        let mut blockers = Vec::new();
        let mut cascades: Vec<(String, String)> = Vec::new();
        for other in self.collections.values().filter(|c| c.id != id) {
            for field in other.relations_to(&id) {
                match field.relation() {
                    Some((_, true)) => cascades.push((other.id.clone(), field.id.clone())),
                    _ => blockers.push(format!("{}.{}", other.name, field.name)),
                }
            }
        }
        if !blockers.is_empty() {
            return Err(StrataError::ConstraintViolation(format!(
                "collection '{}' is still referenced by {}",
                id_or_name,
                blockers.join(", ")
            )));
        }

        for (collection_id, field_id) in cascades {
            if let Some(other) = self.collections.get_mut(&collection_id) {
                debug!("Cascade removing relation field {} from {}", field_id, other.name);
                other.fields.retain(|f| f.id != field_id);
            }
        }

        let removed = self
            .collections
            .remove(&id)
            .ok_or_else(|| StrataError::NotFound(format!("collection '{}'", id)))?;
        self.names.remove(&removed.name);
        Ok(removed)
    }

    /// Insert a new field at `position`, shifting later fields right.
    pub fn add_field(&mut self, collection: &str, position: usize, field: FieldDef) -> Result<()> {
        let mut updated = self.find_collection(collection)?.clone();

        if updated.field(&field.id).is_some() {
            return Err(StrataError::Conflict(format!(
                "field id '{}' already exists in '{}'",
                field.id, updated.name
            )));
        }
        insert_at(&mut updated, position, field)?;
        self.save_collection(updated)
    }

    /// Insert a field at `position`, replacing any existing field with the same id.
    ///
    /// The existing field is removed before the slot is computed, so re-adding
    /// a field at its current position is an in-place update.
    pub fn upsert_field(&mut self, collection: &str, position: usize, field: FieldDef) -> Result<()> {
        let mut updated = self.find_collection(collection)?.clone();

        if let Some(existing) = updated.position_of(&field.id) {
            updated.fields.remove(existing);
        }
        insert_at(&mut updated, position, field)?;
        self.save_collection(updated)
    }

    /// Remove a field by id and return it.
    pub fn remove_field(&mut self, collection: &str, field_id: &str) -> Result<FieldDef> {
        let mut updated = self.find_collection(collection)?.clone();

        let position = updated.position_of(field_id).ok_or_else(|| {
            StrataError::NotFound(format!("field '{}' in '{}'", field_id, updated.name))
        })?;
        let removed = updated.fields.remove(position);
        self.save_collection(updated)?;
        Ok(removed)
    }

    /// Patch an existing field, keeping its id and, unless patched, its position.
    pub fn mutate_field(&mut self, collection: &str, field_id: &str, patch: &FieldPatch) -> Result<()> {
        let mut updated = self.find_collection(collection)?.clone();

        let current = updated.position_of(field_id).ok_or_else(|| {
            StrataError::NotFound(format!("field '{}' in '{}'", field_id, updated.name))
        })?;
        let mut field = updated.fields.remove(current);
        patch.apply_to(&mut field);
        insert_at(&mut updated, patch.position.unwrap_or(current), field)?;
        self.save_collection(updated)
    }

    /// Replace all access rules of a collection.
    pub fn set_access_rules(&mut self, collection: &str, rules: AccessRules) -> Result<()> {
        let mut updated = self.find_collection(collection)?.clone();
        updated.rules = rules;
        self.save_collection(updated)
    }

    /// All relation fields (collection id, field) that target `collection_id`.
    pub fn references_to(&self, collection_id: &str) -> Vec<(&str, &FieldDef)> {
        self.collections
            .values()
            .flat_map(|c| c.relations_to(collection_id).map(move |f| (c.id.as_str(), f)))
            .collect()
    }

    fn validate_fields(&self, collection: &CollectionDef) -> Result<()> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();

        for field in &collection.fields {
            if field.id.is_empty() || field.name.is_empty() {
                return Err(StrataError::ConstraintViolation(format!(
                    "field id and name must not be empty in '{}'",
                    collection.name
                )));
            }
            if !ids.insert(field.id.as_str()) {
                return Err(StrataError::Conflict(format!(
                    "duplicate field id '{}' in '{}'",
                    field.id, collection.name
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(StrataError::Conflict(format!(
                    "duplicate field name '{}' in '{}'",
                    field.name, collection.name
                )));
            }
            if let Some((target, _)) = field.relation() {
                if target != collection.id && !self.collections.contains_key(target) {
                    return Err(StrataError::ConstraintViolation(format!(
                        "relation '{}.{}' targets unknown collection '{}'",
                        collection.name, field.name, target
                    )));
                }
            }
        }

        Ok(())
    }
}

fn insert_at(collection: &mut CollectionDef, position: usize, field: FieldDef) -> Result<()> {
    if position > collection.fields.len() {
        return Err(StrataError::ConstraintViolation(format!(
            "position {} is out of range for '{}' with {} fields",
            position,
            collection.name,
            collection.fields.len()
        )));
    }
    collection.fields.insert(position, field);
    Ok(())
}

/// Serialized form of the registry: collections ordered by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub collections: Vec<CollectionDef>,
}

impl From<SchemaRegistry> for RegistrySnapshot {
    fn from(registry: SchemaRegistry) -> Self {
        Self {
            collections: registry.collections.into_values().collect(),
        }
    }
}

impl TryFrom<RegistrySnapshot> for SchemaRegistry {
    type Error = StrataError;

    fn try_from(snapshot: RegistrySnapshot) -> Result<Self> {
        let mut registry = SchemaRegistry::new();
        // Relation targets may appear later in the snapshot, so index everything first.
        for collection in snapshot.collections {
            if registry.names.insert(collection.name.clone(), collection.id.clone()).is_some() {
                return Err(StrataError::Conflict(format!(
                    "collection name '{}' already exists",
                    collection.name
                )));
            }
            if registry
                .collections
                .insert(collection.id.clone(), collection)
                .is_some()
            {
                return Err(StrataError::Conflict("duplicate collection id in snapshot".into()));
            }
        }
        for collection in registry.collections.values() {
            registry.validate_fields(collection)?;
        }
        Ok(registry)
    }
}
