//! In-process entity store
//!
//! [`EntityStore`] keeps every component's entities in memory, optionally
//! mirrored to a JSON file, and serves dialogs through [`EntityTransport`].
//! It answers the way a REST backend would: 409 for a duplicate name, 404
//! for a missing entity.
//!
//! Completions can be held back and released later, which is how a slow
//! backend (and a dialog closed before its save lands) is reproduced.

use crate::entity::SavedEntity;
use crate::transport::{
    Completer, DeleteRequest, EntityTransport, Outcome, Pending, PersistenceFailure, SaveKind,
    SaveRequest,
};
use confdesk_core::{Attributes, DialogError, DialogResult, NAME_ATTRIBUTE, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

type Entities = BTreeMap<String, BTreeMap<String, Attributes>>;

#[derive(Default)]
struct StoreState {
    entities: Entities,
    path: Option<PathBuf>,
    fail_next: Option<PersistenceFailure>,
    offline: bool,
    hold: bool,
    held: Vec<Box<dyn FnOnce()>>,
}

/// Entity store shared by every dialog of a console
#[derive(Clone, Default)]
pub struct EntityStore {
    state: Rc<RefCell<StoreState>>,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EntityStore")
            .field("components", &state.entities.len())
            .field("path", &state.path)
            .field("offline", &state.offline)
            .field("held", &state.held.len())
            .finish()
    }
}

impl EntityStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a JSON file, creating it on first write
    pub fn open(path: impl AsRef<Path>) -> DialogResult<Self> {
        let path = path.as_ref();
        let entities = if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|e| DialogError::FileRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            serde_json::from_str(&text).map_err(|e| DialogError::FileRead {
                path: path.to_path_buf(),
                message: format!("Invalid store file format: {}", e),
            })?
        } else {
            Entities::new()
        };

        tracing::info!("Opened entity store at {}", path.display());
        let store = Self::new();
        {
            let mut state = store.state.borrow_mut();
            state.entities = entities;
            state.path = Some(path.to_path_buf());
        }
        Ok(store)
    }

    /// Write the store to its file, if it has one
    pub fn flush(&self) -> DialogResult<()> {
        let state = self.state.borrow();
        let Some(path) = &state.path else {
            return Ok(());
        };
        write_file(path, &state.entities)
    }

    // ========================================================================
    // Direct access
    // ========================================================================

    /// Entities of a component, ordered by name
    pub fn list(&self, component: &str) -> Vec<(String, Attributes)> {
        self.state
            .borrow()
            .entities
            .get(component)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, component: &str, name: &str) -> Option<Attributes> {
        self.state
            .borrow()
            .entities
            .get(component)
            .and_then(|m| m.get(name))
            .cloned()
    }

    pub fn count(&self, component: &str) -> usize {
        self.state
            .borrow()
            .entities
            .get(component)
            .map_or(0, BTreeMap::len)
    }

    /// Put an entity in place without going through a dialog
    pub fn insert(&self, component: &str, name: &str, mut content: Attributes) {
        content.insert(NAME_ATTRIBUTE.to_string(), Value::String(name.to_string()));
        self.state
            .borrow_mut()
            .entities
            .entry(component.to_string())
            .or_default()
            .insert(name.to_string(), content);
    }

    // ========================================================================
    // Failure injection
    // ========================================================================

    /// Fail the next operation with `failure`
    pub fn fail_next(&self, failure: PersistenceFailure) {
        self.state.borrow_mut().fail_next = Some(failure);
    }

    /// While offline no operation can be started
    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    /// Hold completions until [`EntityStore::release_held`]
    pub fn hold_completions(&self, hold: bool) {
        self.state.borrow_mut().hold = hold;
    }

    /// Run every held operation; returns how many ran
    pub fn release_held(&self) -> usize {
        let held = std::mem::take(&mut self.state.borrow_mut().held);
        let count = held.len();
        for run in held {
            run();
        }
        count
    }

    // ========================================================================
    // Operations
    // ========================================================================

    fn start<T: 'static>(
        &self,
        op: impl FnOnce(&mut StoreState) -> Outcome<T> + 'static,
    ) -> Option<Pending<T>> {
        if self.state.borrow().offline {
            tracing::warn!("Entity store is offline; operation not started");
            return None;
        }

        let (completer, pending) = Pending::channel();
        let state = self.state.clone();
        let run = move || finish(&state, op, completer);

        if self.state.borrow().hold {
            self.state.borrow_mut().held.push(Box::new(run));
        } else {
            run();
        }
        Some(pending)
    }
}

fn finish<T>(
    state: &Rc<RefCell<StoreState>>,
    op: impl FnOnce(&mut StoreState) -> Outcome<T>,
    completer: Completer<T>,
) {
    let outcome = {
        let mut state = state.borrow_mut();
        match state.fail_next.take() {
            Some(failure) => Err(failure),
            None => {
                let before = state.entities.clone();
                let outcome = op(&mut *state).and_then(|value| {
                    if let Some(path) = &state.path {
                        write_file(path, &state.entities)
                            .map_err(|e| PersistenceFailure::new(500, e.to_string()))?;
                    }
                    Ok(value)
                });
                if outcome.is_err() {
                    state.entities = before;
                }
                outcome
            }
        }
    };

    if let Err(failure) = &outcome {
        tracing::warn!("Entity store rejected operation: {}", failure);
    }
    if !completer.complete(outcome) {
        tracing::debug!("Nobody is waiting for the completed operation");
    }
}

fn write_file(path: &Path, entities: &Entities) -> DialogResult<()> {
    let json = serde_json::to_string_pretty(entities)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, json).map_err(|e| DialogError::FileWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn save(state: &mut StoreState, request: SaveRequest) -> Outcome<SavedEntity> {
    if request.name.trim().is_empty() {
        return Err(PersistenceFailure::rest(400, "Field Name is required"));
    }

    let entities = state.entities.entry(request.component.clone()).or_default();
    let exists = entities.contains_key(&request.name);
    match request.kind {
        SaveKind::Create if exists => {
            return Err(PersistenceFailure::rest(
                409,
                format!("Name \"{}\" is already in use", request.name),
            ));
        }
        SaveKind::Update if !exists => {
            return Err(PersistenceFailure::rest(
                404,
                format!("Could not find object id={}", request.name),
            ));
        }
        _ => {}
    }

    // An update keeps stored attributes the request leaves out
    let mut content = match request.kind {
        SaveKind::Update => entities.remove(&request.name).unwrap_or_default(),
        SaveKind::Create => Attributes::new(),
    };
    content.extend(request.content);
    content.insert(
        NAME_ATTRIBUTE.to_string(),
        Value::String(request.name.clone()),
    );
    entities.insert(request.name.clone(), content.clone());
    tracing::info!(
        "Saved '{}' in '{}' ({:?})",
        request.name,
        request.component,
        request.kind
    );
    Ok(SavedEntity::new(request.name, content))
}

impl EntityTransport for EntityStore {
    fn create(&self, request: SaveRequest) -> Option<Pending<SavedEntity>> {
        self.start(move |state| save(state, request))
    }

    fn update(&self, request: SaveRequest) -> Option<Pending<SavedEntity>> {
        self.start(move |state| save(state, request))
    }

    fn delete(&self, request: DeleteRequest) -> Option<Pending<()>> {
        self.start(move |state| {
            let removed = state
                .entities
                .get_mut(&request.component)
                .and_then(|m| m.remove(&request.name));
            match removed {
                Some(_) => {
                    tracing::info!("Deleted '{}' from '{}'", request.name, request.component);
                    Ok(())
                }
                None => Err(PersistenceFailure::rest(
                    404,
                    format!("Could not find object id={}", request.name),
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use tokio_test::block_on;

    fn request(kind: SaveKind, name: &str, content: Value) -> SaveRequest {
        SaveRequest {
            component: "account".to_string(),
            kind,
            name: name.to_string(),
            content: content.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_create_then_duplicate() {
        let store = EntityStore::new();
        let saved = block_on(
            store
                .create(request(SaveKind::Create, "a", json!({"port": 1})))
                .unwrap()
                .wait(),
        )
        .unwrap();
        assert_eq!(saved.content.get("name"), Some(&json!("a")));

        let dup = block_on(
            store
                .create(request(SaveKind::Create, "a", json!({})))
                .unwrap()
                .wait(),
        )
        .unwrap_err();
        assert_eq!(dup.status, 409);
        assert_eq!(dup.display_message(), "Name \"a\" is already in use");
    }

    #[test]
    fn test_update_missing_is_404() {
        let store = EntityStore::new();
        let failure = block_on(
            store
                .update(request(SaveKind::Update, "ghost", json!({})))
                .unwrap()
                .wait(),
        )
        .unwrap_err();
        assert_eq!(failure.status, 404);
    }

    #[test]
    fn test_offline_cannot_start() {
        let store = EntityStore::new();
        store.set_offline(true);
        assert!(
            store
                .create(request(SaveKind::Create, "a", json!({})))
                .is_none()
        );
    }

    #[test]
    fn test_fail_next_once() {
        let store = EntityStore::new();
        store.fail_next(PersistenceFailure::new(500, "boom"));
        let first = store.create(request(SaveKind::Create, "a", json!({})));
        assert!(block_on(first.unwrap().wait()).is_err());
        let second = store.create(request(SaveKind::Create, "a", json!({})));
        assert!(block_on(second.unwrap().wait()).is_ok());
        assert_eq!(store.count("account"), 1);
    }

    #[test]
    fn test_held_completions() {
        let store = EntityStore::new();
        store.hold_completions(true);
        let mut pending = store
            .create(request(SaveKind::Create, "a", json!({})))
            .unwrap();

        assert!(pending.try_take().is_none());
        assert_eq!(store.count("account"), 0);

        assert_eq!(store.release_held(), 1);
        assert!(pending.try_take().unwrap().is_ok());
        assert_eq!(store.count("account"), 1);
    }

    #[test]
    fn test_delete() {
        let store = EntityStore::new();
        store.insert("account", "a", Attributes::new());
        let request = DeleteRequest {
            component: "account".to_string(),
            name: "a".to_string(),
        };
        assert!(block_on(store.delete(request.clone()).unwrap().wait()).is_ok());
        assert_eq!(
            block_on(store.delete(request).unwrap().wait())
                .unwrap_err()
                .status,
            404
        );
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = EntityStore::open(&path).unwrap();
        block_on(
            store
                .create(request(SaveKind::Create, "a", json!({"host": "h1"})))
                .unwrap()
                .wait(),
        )
        .unwrap();

        let reopened = EntityStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("account", "a").unwrap().get("host"),
            Some(&json!("h1"))
        );
        assert_eq!(reopened.list("account").len(), 1);
    }

    #[test]
    fn test_update_keeps_omitted_attributes() {
        let store = EntityStore::new();
        store.insert(
            "account",
            "a",
            json!({"port": 1, "secret": "s3cr3t"}).as_object().cloned().unwrap(),
        );

        let saved = block_on(
            store
                .update(request(SaveKind::Update, "a", json!({"port": 2})))
                .unwrap()
                .wait(),
        )
        .unwrap();

        let stored = store.get("account", "a").unwrap();
        assert_eq!(stored.get("port"), Some(&json!(2)));
        assert_eq!(stored.get("secret"), Some(&json!("s3cr3t")));
        assert_eq!(saved.content.get("secret"), Some(&json!("s3cr3t")));
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = EntityStore::open(blocker.join("store.json")).unwrap();

        let failure = block_on(
            store
                .create(request(SaveKind::Create, "a", json!({"port": 1})))
                .unwrap()
                .wait(),
        )
        .unwrap_err();
        assert_eq!(failure.status, 500);
        assert_eq!(store.count("account"), 0);

        let retry = block_on(
            store
                .create(request(SaveKind::Create, "a", json!({"port": 1})))
                .unwrap()
                .wait(),
        )
        .unwrap_err();
        assert_eq!(retry.status, 500);
        assert_eq!(store.count("account"), 0);
    }
}
