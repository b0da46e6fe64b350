//! Collections and pagination synchronization
//!
//! A [`Collection`] is the list a table view renders: loaded entity
//! handles plus pagination. It outlives the dialogs that mutate it.

use crate::entity::EntityHandle;
use confdesk_core::{Attributes, DialogError, DialogResult, Pagination};
use std::cell::RefCell;
use std::rc::Rc;

/// Collection shared between the table view and its dialogs
pub type SharedCollection = Rc<RefCell<Collection>>;

/// Page position owned by the table view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub offset: usize,
    /// Rows per page
    pub count: usize,
}

impl PageState {
    pub fn new(offset: usize, count: usize) -> Self {
        Self { offset, count }
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(0, Pagination::default().per_page)
    }
}

/// Ordered entities of one component
#[derive(Debug, Clone)]
pub struct Collection {
    component: String,
    entities: Vec<EntityHandle>,
    pagination: Pagination,
    revision: u64,
    reset_revision: u64,
}

impl Collection {
    /// Create an empty collection
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            entities: Vec::new(),
            pagination: Pagination::default(),
            revision: 0,
            reset_revision: 0,
        }
    }

    /// Create a collection from loaded `(name, content)` pairs
    pub fn from_entities(
        component: impl Into<String>,
        entities: impl IntoIterator<Item = (String, Attributes)>,
    ) -> Self {
        let mut collection = Self::new(component);
        collection.entities = entities
            .into_iter()
            .map(|(name, content)| EntityHandle::loaded(name, content))
            .collect();
        let total = collection.entities.len();
        collection.pagination.total = total;
        for entity in &collection.entities {
            entity.borrow_mut().pagination = collection.pagination;
        }
        collection
    }

    /// Wrap for sharing
    pub fn shared(self) -> SharedCollection {
        Rc::new(RefCell::new(self))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn entities(&self) -> &[EntityHandle] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Bumped on every "changed" signal
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bumped on every structural reset
    pub fn reset_revision(&self) -> u64 {
        self.reset_revision
    }

    /// Find an entity by name
    pub fn find(&self, name: &str) -> Option<EntityHandle> {
        self.entities
            .iter()
            .find(|e| e.borrow().name.as_deref() == Some(name))
            .cloned()
    }

    // ========================================================================
    // Signals
    // ========================================================================

    /// Signal that some entity changed
    pub fn trigger_changed(&mut self) {
        self.revision += 1;
    }

    /// Structurally reset the visible set so dependents re-render
    pub fn reset(&mut self) {
        self.reset_revision += 1;
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Append a newly created entity and bring every total up to date
    pub fn sync_after_create(&mut self, handle: EntityHandle) {
        if !self.entities.iter().any(|e| e.ptr_eq(&handle)) {
            self.entities.push(handle);
        }

        let total = self.entities.len();
        for entity in &self.entities {
            entity.borrow_mut().pagination.total = total;
        }
        self.reset();
        self.pagination.total = total;

        tracing::debug!(
            "Collection '{}' now holds {} entities",
            self.component,
            total
        );
    }

    /// Remove a deleted entity and repair pagination
    ///
    /// When the current page empties, the page steps back by `page.count`
    /// rows and `page` follows it.
    pub fn sync_after_delete(&mut self, name: &str, page: &mut PageState) -> DialogResult<()> {
        let index = self
            .entities
            .iter()
            .position(|e| e.borrow().name.as_deref() == Some(name))
            .ok_or_else(|| DialogError::EntityNotFound {
                component: self.component.clone(),
                name: name.to_string(),
            })?;
        self.entities.remove(index);

        if !self.entities.is_empty() {
            for entity in &self.entities {
                let mut entity = entity.borrow_mut();
                entity.pagination.total = entity.pagination.total.saturating_sub(1);
            }
            self.reset();
            self.pagination.total = self.entities.len();
        } else {
            let PageState { offset, count } = *page;
            let new_offset = offset.saturating_sub(count);

            self.pagination = Pagination::new(new_offset, count, offset);
            page.offset = new_offset;
            self.reset();
        }

        tracing::debug!(
            "Removed '{}' from '{}'; total is now {}",
            name,
            self.component,
            self.pagination.total
        );
        Ok(())
    }
}
