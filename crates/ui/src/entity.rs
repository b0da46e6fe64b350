//! Persisted entity handles
//!
//! A [`PersistedEntity`] holds an entity's attributes as last known from the
//! store. Dialogs and collections share it through an [`EntityHandle`].

use chrono::{DateTime, Utc};
use confdesk_core::{Attributes, NAME_ATTRIBUTE, Pagination, Value};
use confdesk_schema::EncryptedFieldSet;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

// ============================================================================
// SavedEntity
// ============================================================================

/// What the store returns for a successful create or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntity {
    pub name: String,
    pub content: Attributes,
}

impl SavedEntity {
    pub fn new(name: impl Into<String>, content: Attributes) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

// ============================================================================
// PersistedEntity
// ============================================================================

/// Canonical attributes of one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEntity {
    /// Identity; `None` until the entity has been created
    pub name: Option<String>,

    /// Attributes as last known from the store
    pub content: Attributes,

    /// This entity's view of its collection's pagination
    pub pagination: Pagination,

    /// Field labels attached at save time
    #[serde(default)]
    pub attr_labels: BTreeMap<String, String>,

    /// When the entity was last persisted
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,

    /// Bumped on every "changed" signal
    #[serde(skip)]
    pub revision: u64,
}

impl PersistedEntity {
    /// Create an entity that has never been persisted
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity loaded from the store
    pub fn loaded(name: impl Into<String>, content: Attributes) -> Self {
        Self {
            name: Some(name.into()),
            content,
            ..Self::default()
        }
    }

    /// Whether the entity exists in the store
    pub fn has_identity(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Copy every draft attribute onto the content
    pub fn merge_content(&mut self, values: &Attributes) {
        for (key, value) in values {
            self.content.insert(key.clone(), value.clone());
        }
    }

    /// Take the store's answer as the new canonical state
    pub fn apply_saved(&mut self, saved: SavedEntity) {
        self.content = saved.content;
        self.content
            .insert(NAME_ATTRIBUTE.to_string(), Value::String(saved.name.clone()));
        self.name = Some(saved.name);
        self.updated = Some(Utc::now());
    }

    /// Remove encrypted attributes; returns the fields removed
    pub fn strip_encrypted(&mut self, encrypted: &EncryptedFieldSet) -> Vec<String> {
        encrypted.strip(&mut self.content)
    }

    /// Signal that the content changed
    pub fn trigger_changed(&mut self) {
        self.revision += 1;
    }
}

// ============================================================================
// EntityHandle
// ============================================================================

/// Shared reference to a persisted entity
#[derive(Debug, Clone, Default)]
pub struct EntityHandle(Rc<RefCell<PersistedEntity>>);

impl EntityHandle {
    pub fn new(entity: PersistedEntity) -> Self {
        Self(Rc::new(RefCell::new(entity)))
    }

    /// Handle to an entity loaded from the store
    pub fn loaded(name: impl Into<String>, content: Attributes) -> Self {
        Self::new(PersistedEntity::loaded(name, content))
    }

    pub fn borrow(&self) -> Ref<'_, PersistedEntity> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, PersistedEntity> {
        self.0.borrow_mut()
    }

    /// Whether two handles point at the same entity
    pub fn ptr_eq(&self, other: &EntityHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    /// Copy of the content
    pub fn content(&self) -> Attributes {
        self.0.borrow().content.clone()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.borrow().content.get(field).cloned()
    }

    pub fn pagination(&self) -> Pagination {
        self.0.borrow().pagination
    }

    pub fn revision(&self) -> u64 {
        self.0.borrow().revision
    }
}

impl PartialEq for EntityHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
