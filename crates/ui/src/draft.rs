//! Draft model
//!
//! The in-dialog working copy of an entity's attributes. Every mutation
//! dispatches its [`FieldChanged`] events synchronously, in order, to the
//! registered listeners. Seeding does not dispatch.

use confdesk_core::{Attributes, FieldChanged, Value};
use std::fmt;

/// Callback receiving the draft snapshot and the changes of one mutation
pub type DraftListener = Box<dyn FnMut(&Attributes, &[FieldChanged])>;

/// Working copy of the attributes a dialog edits
#[derive(Default)]
pub struct DraftModel {
    values: Attributes,
    listeners: Vec<DraftListener>,
}

impl fmt::Debug for DraftModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftModel")
            .field("values", &self.values)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DraftModel {
    /// Create an empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a draft seeded with `values`
    pub fn from_attributes(values: Attributes) -> Self {
        Self {
            values,
            listeners: Vec::new(),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Borrow the current values
    pub fn values(&self) -> &Attributes {
        &self.values
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> Attributes {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Set one attribute; no event when the value is unchanged
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<FieldChanged> {
        let field = field.into();
        let value = value.into();
        let change = self.write(field, Some(value))?;
        self.dispatch(std::slice::from_ref(&change));
        Some(change)
    }

    /// Set several attributes as one mutation
    pub fn set_many(&mut self, values: Attributes) -> Vec<FieldChanged> {
        let changes: Vec<_> = values
            .into_iter()
            .filter_map(|(field, value)| self.write(field, Some(value)))
            .collect();
        self.dispatch(&changes);
        changes
    }

    /// Remove one attribute
    pub fn unset(&mut self, field: &str) -> Option<FieldChanged> {
        let change = self.write(field.to_string(), None)?;
        self.dispatch(std::slice::from_ref(&change));
        Some(change)
    }

    fn write(&mut self, field: String, value: Option<Value>) -> Option<FieldChanged> {
        let old = self.values.get(&field).cloned();
        if old == value {
            return None;
        }
        match &value {
            Some(v) => {
                self.values.insert(field.clone(), v.clone());
            }
            None => {
                self.values.remove(&field);
            }
        }
        Some(FieldChanged::new(field, old, value))
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Register a listener called after every mutation
    pub fn subscribe(&mut self, listener: impl FnMut(&Attributes, &[FieldChanged]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drop every listener
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn dispatch(&mut self, changes: &[FieldChanged]) {
        if changes.is_empty() {
            return;
        }
        for listener in self.listeners.iter_mut() {
            listener(&self.values, changes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(draft: &mut DraftModel) -> Rc<RefCell<Vec<Vec<FieldChanged>>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        draft.subscribe(move |_values, changes| sink.borrow_mut().push(changes.to_vec()));
        seen
    }

    #[test]
    fn test_seed_does_not_dispatch() {
        let mut attrs = Attributes::new();
        attrs.insert("host".into(), json!("h1"));
        let mut draft = DraftModel::from_attributes(attrs);
        let seen = recorder(&mut draft);

        assert_eq!(draft.get("host"), Some(&json!("h1")));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_set_dispatches_typed_event() {
        let mut draft = DraftModel::new();
        let seen = recorder(&mut draft);

        draft.set("port", 8089);
        draft.set("port", 8089);
        draft.set("port", 9000);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], vec![FieldChanged::new("port", None, Some(json!(8089)))]);
        assert_eq!(
            seen[1],
            vec![FieldChanged::new("port", Some(json!(8089)), Some(json!(9000)))]
        );
    }

    #[test]
    fn test_set_many_is_one_mutation() {
        let mut draft = DraftModel::new();
        let seen = recorder(&mut draft);

        let batch = json!({"name": "", "port": 8089}).as_object().cloned().unwrap();
        let changes = draft.set_many(batch);

        assert_eq!(changes.len(), 2);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(draft.len(), 2);
    }

    #[test]
    fn test_listener_sees_updated_snapshot() {
        let mut draft = DraftModel::new();
        let last = Rc::new(RefCell::new(Attributes::new()));
        let sink = last.clone();
        draft.subscribe(move |values, _| *sink.borrow_mut() = values.clone());

        draft.set("auth", "basic");
        assert_eq!(last.borrow().get("auth"), Some(&json!("basic")));

        draft.unset("auth");
        assert!(last.borrow().is_empty());
        assert!(draft.unset("auth").is_none());
    }

    #[test]
    fn test_clear_listeners() {
        let mut draft = DraftModel::new();
        let seen = recorder(&mut draft);
        draft.clear_listeners();
        draft.set("a", 1);
        assert!(seen.borrow().is_empty());
        assert_eq!(draft.listener_count(), 0);
    }
}
