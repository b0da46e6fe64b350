//! Entity dialog controller
//!
//! Drives one add / edit / clone dialog from opening to close: seeds the
//! draft, runs hooks on every draft mutation, validates, and performs the
//! optimistic save against the entity handle.
//!
//! A save runs in two steps so a UI event loop never holds the dialog
//! across an await: [`EntityDialog::begin_save`] starts it and hands back
//! the pending operation, [`EntityDialog::finish_save`] applies the
//! outcome. [`EntityDialog::submit`] does both for callers that can await.

use crate::collection::SharedCollection;
use crate::draft::DraftModel;
use crate::entity::{EntityHandle, PersistedEntity, SavedEntity};
use crate::prompt::{PromptBoard, PromptState};
use crate::render::{ControlState, ControlStates, DialogTemplate, DialogView, build_controls};
use crate::transaction::SaveTransaction;
use crate::transport::{EntityTransport, Outcome, Pending, SaveKind, SaveRequest};
use confdesk_core::messages::{MSG_ADD_TITLE, MSG_CLONE_TITLE, MSG_EDIT_TITLE, MSG_REQUIRED};
use confdesk_core::{
    Attributes, ControlCommands, DialogError, DialogResult, FieldChanged, LifecycleMode,
    NAME_ATTRIBUTE, OnChangeHook, OnLoadHook, REF_COUNT_ATTRIBUTE, SessionId, Value,
    changed_attributes, display_value, formatted_message, is_blank,
};
use confdesk_schema::{
    ComponentConfig, HookRegistry, ResolvedSchema, ValidationError, ValidationErrorCode,
    ValidationResult,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Request / Context
// ============================================================================

/// Which dialog to open
#[derive(Debug, Clone)]
pub enum DialogRequest {
    /// New entity from an empty draft
    Create,
    /// The collection's existing entity
    Edit(EntityHandle),
    /// New entity seeded from an existing one
    Clone(EntityHandle),
}

impl DialogRequest {
    pub fn mode(&self) -> LifecycleMode {
        match self {
            DialogRequest::Create => LifecycleMode::Create,
            DialogRequest::Edit(_) => LifecycleMode::Edit,
            DialogRequest::Clone(_) => LifecycleMode::Clone,
        }
    }
}

/// What a dialog works against
#[derive(Clone)]
pub struct DialogContext {
    pub schema: Rc<ResolvedSchema>,
    pub collection: SharedCollection,
    pub transport: Rc<dyn EntityTransport>,
    pub prompts: PromptBoard,
    /// Whether the component is an input service
    pub is_input: bool,
}

impl fmt::Debug for DialogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogContext")
            .field("component", &self.schema.name())
            .field("entities", &self.collection.borrow().len())
            .field("is_input", &self.is_input)
            .finish()
    }
}

impl DialogContext {
    pub fn new(
        schema: Rc<ResolvedSchema>,
        collection: SharedCollection,
        transport: Rc<dyn EntityTransport>,
        prompts: PromptBoard,
    ) -> Self {
        Self {
            schema,
            collection,
            transport,
            prompts,
            is_input: false,
        }
    }

    /// Resolve `component` and build a context around it
    ///
    /// Schema errors surface here and no dialog can be opened.
    pub fn resolve(
        component: &ComponentConfig,
        registry: &HookRegistry,
        collection: SharedCollection,
        transport: Rc<dyn EntityTransport>,
        prompts: PromptBoard,
    ) -> DialogResult<Self> {
        let schema = ResolvedSchema::resolve(component, registry)?;
        Ok(Self::new(Rc::new(schema), collection, transport, prompts))
    }

    pub fn with_input(mut self, is_input: bool) -> Self {
        self.is_input = is_input;
        self
    }
}

// ============================================================================
// Phases and outcomes
// ============================================================================

/// Where a dialog is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    /// Editable, submit possible
    Open,
    /// A save is in flight
    Saving,
    /// Closed; only a late completion can still arrive
    Closed,
}

/// How a save attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Submit was disabled or the dialog was not open
    Ignored,
    /// The draft failed validation; nothing was sent
    Invalid(ValidationResult),
    /// The store could not start the operation
    NotInitiated,
    /// The store accepted the save and the dialog closed
    Committed,
    /// The store rejected the save; the entity is back to its old content
    RolledBack { message: String },
}

/// Result of starting a save
#[derive(Debug)]
pub enum SaveStart {
    /// Nothing was sent
    Done(SaveOutcome),
    /// Waiting on the store
    Pending(Pending<SavedEntity>),
}

// ============================================================================
// EntityDialog
// ============================================================================

/// Controller of one add / edit / clone dialog
#[derive(Debug)]
pub struct EntityDialog {
    session: SessionId,
    mode: LifecycleMode,
    ctx: DialogContext,
    draft: DraftModel,
    handle: EntityHandle,
    controls: Rc<RefCell<ControlStates>>,
    clone_source: Option<String>,
    submit_enabled: bool,
    phase: DialogPhase,
    transaction: Option<SaveTransaction>,
}

impl EntityDialog {
    /// Open a dialog
    pub fn open(request: DialogRequest, ctx: DialogContext) -> DialogResult<Self> {
        let mode = request.mode();
        let schema = ctx.schema.clone();

        let (handle, seed, clone_source) = match request {
            DialogRequest::Create => {
                let entity = PersistedEntity {
                    pagination: ctx.collection.borrow().pagination(),
                    ..PersistedEntity::new()
                };
                (EntityHandle::new(entity), Attributes::new(), None)
            }
            DialogRequest::Edit(source) => {
                let name = source.name().ok_or_else(|| {
                    DialogError::invalid_state("cannot edit an entity that was never saved")
                })?;
                source.borrow_mut().strip_encrypted(schema.encrypted());
                let mut seed = source.content();
                seed.insert(NAME_ATTRIBUTE.to_string(), Value::String(name));
                (source, seed, None)
            }
            DialogRequest::Clone(source) => {
                source.borrow_mut().strip_encrypted(schema.encrypted());
                let mut seed = source.content();
                seed.remove(NAME_ATTRIBUTE);
                seed.remove(REF_COUNT_ATTRIBUTE);
                let entity = PersistedEntity {
                    pagination: source.pagination(),
                    ..PersistedEntity::new()
                };
                (EntityHandle::new(entity), seed, source.name())
            }
        };

        let mut draft = DraftModel::from_attributes(seed);
        draft.set_many(schema.missing_defaults(draft.values()));

        let controls = Rc::new(RefCell::new(ControlStates::from_schema(&schema)));

        if let Some(hook) = schema.hooks().on_change.clone() {
            let widgets = schema.widget_ids().clone();
            let controls = controls.clone();
            draft.subscribe(move |form, changes| {
                let changed = changed_attributes(changes);
                let mut commands = ControlCommands::new();
                hook.on_change(form, &changed, &widgets, &mut commands);
                controls.borrow_mut().apply(commands.into_commands());
            });
        }

        if let Some(hook) = &schema.hooks().on_load {
            let mut commands = ControlCommands::new();
            hook.on_load(draft.values(), schema.widget_ids(), &mut commands);
            controls.borrow_mut().apply(commands.into_commands());
        }

        let session = SessionId::new();
        ctx.prompts.open_session(session);
        tracing::info!(
            "Opened {} dialog for '{}' (session {})",
            mode,
            schema.name(),
            session
        );

        Ok(Self {
            session,
            mode,
            ctx,
            draft,
            handle,
            controls,
            clone_source,
            submit_enabled: true,
            phase: DialogPhase::Open,
            transaction: None,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn mode(&self) -> LifecycleMode {
        self.mode
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == DialogPhase::Closed
    }

    pub fn schema(&self) -> &ResolvedSchema {
        &self.ctx.schema
    }

    pub fn draft(&self) -> &DraftModel {
        &self.draft
    }

    /// The entity this dialog writes to
    pub fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// Name of the entity a clone was seeded from
    pub fn clone_source(&self) -> Option<&str> {
        self.clone_source.as_deref()
    }

    /// State of a control by widget id
    pub fn control_state(&self, widget_id: &str) -> Option<ControlState> {
        self.controls.borrow().get(widget_id)
    }

    /// What the session currently shows
    pub fn prompt(&self) -> PromptState {
        self.ctx.prompts.state(self.session).unwrap_or_default()
    }

    // ========================================================================
    // Draft edits
    // ========================================================================

    fn check_editable(&self, field: &str) -> DialogResult<()> {
        if self.is_closed() {
            return Err(DialogError::invalid_state("dialog is closed"));
        }
        if field == NAME_ATTRIBUTE && !self.mode.identity_editable() {
            return Err(DialogError::field_validation(
                field,
                "the name of an existing entity cannot be changed",
            ));
        }
        Ok(())
    }

    /// Set one draft attribute
    pub fn set_field(
        &mut self,
        field: &str,
        value: impl Into<Value>,
    ) -> DialogResult<Option<FieldChanged>> {
        self.check_editable(field)?;
        Ok(self.draft.set(field, value))
    }

    /// Set several draft attributes as one mutation
    pub fn set_fields(&mut self, values: Attributes) -> DialogResult<Vec<FieldChanged>> {
        for field in values.keys() {
            self.check_editable(field)?;
        }
        Ok(self.draft.set_many(values))
    }

    /// Remove one draft attribute
    pub fn unset_field(&mut self, field: &str) -> DialogResult<Option<FieldChanged>> {
        self.check_editable(field)?;
        Ok(self.draft.unset(field))
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Apply defaults to still-unset fields, then build the view
    pub fn render(&mut self) -> DialogView {
        if !self.is_closed() {
            let defaults = self.ctx.schema.missing_defaults(self.draft.values());
            if !defaults.is_empty() {
                self.draft.set_many(defaults);
            }
        }
        self.view()
    }

    /// Build the view without touching the draft
    pub fn view(&self) -> DialogView {
        let prompt = self.prompt();
        DialogView {
            session_class: self.session.class_name(),
            template: self.template(),
            controls: build_controls(
                &self.ctx.schema,
                self.mode,
                self.draft.values(),
                &self.controls.borrow(),
                &prompt.field_errors,
            ),
            submit_enabled: self.submit_enabled,
            saving: prompt.saving,
            error: prompt.error,
            form_errors: prompt.form_errors,
        }
    }

    /// Header variant for this dialog's mode
    pub fn template(&self) -> DialogTemplate {
        let title = self.ctx.schema.title();
        match self.mode {
            LifecycleMode::Create => DialogTemplate {
                mode: self.mode,
                title: formatted_message(MSG_ADD_TITLE, &[title]),
                name: None,
                is_input: Some(self.ctx.is_input),
            },
            LifecycleMode::Edit => DialogTemplate {
                mode: self.mode,
                title: formatted_message(MSG_EDIT_TITLE, &[title]),
                name: None,
                is_input: Some(self.ctx.is_input),
            },
            LifecycleMode::Clone => DialogTemplate {
                mode: self.mode,
                title: formatted_message(MSG_CLONE_TITLE, &[title]),
                name: self.clone_source.clone(),
                is_input: None,
            },
        }
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Validate what is about to be persisted
    fn validate_content(&self, content: &Attributes) -> ValidationResult {
        let mut result = self.ctx.schema.validate_form(content);

        let name_missing = content
            .get(NAME_ATTRIBUTE)
            .is_none_or(|v| display_value(v).trim().is_empty());
        if self.mode.inserts_entity()
            && name_missing
            && !result.field_errors().contains_key(NAME_ATTRIBUTE)
        {
            let label = self.ctx.schema.label(NAME_ATTRIBUTE).unwrap_or("Name");
            result.add_error(
                ValidationError::new(
                    ValidationErrorCode::MissingIdentity,
                    formatted_message(MSG_REQUIRED, &[label]),
                )
                .with_field(NAME_ATTRIBUTE),
            );
        }

        result
    }

    /// Put the handle back and let the user try again
    fn abort(&mut self, mut transaction: SaveTransaction) {
        if let Err(e) = transaction.rollback(&self.handle) {
            tracing::error!("Failed to roll back aborted save: {}", e);
        }
        self.submit_enabled = true;
    }

    /// Start a save
    pub fn begin_save(&mut self) -> SaveStart {
        if self.phase != DialogPhase::Open || !self.submit_enabled {
            tracing::debug!("Ignoring submit in phase {:?}", self.phase);
            return SaveStart::Done(SaveOutcome::Ignored);
        }

        let session = self.session;
        self.submit_enabled = false;
        self.ctx.prompts.clear_error(session);
        self.ctx.prompts.clear_saving(session);
        self.ctx
            .prompts
            .display_validation_error(session, Default::default(), Vec::new());

        let transaction = SaveTransaction::begin(&self.handle);
        {
            let mut entity = self.handle.borrow_mut();
            entity.merge_content(self.draft.values());
            entity.attr_labels = self.ctx.schema.labels().clone();
        }
        let content = self.handle.content();

        let validation = self.validate_content(&content);
        if !validation.valid {
            tracing::debug!(
                "Draft for '{}' rejected: {} errors",
                self.ctx.schema.name(),
                validation.errors.len()
            );
            self.ctx.prompts.display_validation_error(
                session,
                validation.field_errors(),
                validation.form_errors(),
            );
            self.ctx.prompts.add_click_listener(session);
            self.abort(transaction);
            return SaveStart::Done(SaveOutcome::Invalid(validation));
        }

        let (kind, name) = match self.handle.name().filter(|n| !n.is_empty()) {
            Some(name) => (SaveKind::Update, name),
            None => (
                SaveKind::Create,
                content
                    .get(NAME_ATTRIBUTE)
                    .map(display_value)
                    .unwrap_or_default(),
            ),
        };
        let request = SaveRequest {
            component: self.ctx.schema.name().to_string(),
            kind,
            name,
            content,
        };
        let pending = match kind {
            SaveKind::Create => self.ctx.transport.create(request),
            SaveKind::Update => self.ctx.transport.update(request),
        };

        match pending {
            None => {
                tracing::warn!(
                    "Save of '{}' could not be started; rolled back",
                    self.ctx.schema.name()
                );
                self.abort(transaction);
                SaveStart::Done(SaveOutcome::NotInitiated)
            }
            Some(pending) => {
                self.ctx.prompts.show_saving(session);
                self.ctx.prompts.add_click_listener(session);
                self.phase = DialogPhase::Saving;
                self.transaction = Some(transaction);
                SaveStart::Pending(pending)
            }
        }
    }

    /// Apply the outcome of the save started by [`EntityDialog::begin_save`]
    ///
    /// Runs even after the dialog closed: the entity and collection are
    /// reconciled while prompt updates fall on a closed session.
    pub fn finish_save(&mut self, outcome: Outcome<SavedEntity>) -> DialogResult<SaveOutcome> {
        let mut transaction = self
            .transaction
            .take()
            .ok_or_else(|| DialogError::invalid_state("no save in flight"))?;

        if self.is_closed() {
            tracing::debug!("Save completed after session {} closed", self.session);
        }

        match outcome {
            Ok(saved) => {
                transaction.commit()?;
                {
                    let mut entity = self.handle.borrow_mut();
                    entity.apply_saved(saved);
                    entity.strip_encrypted(self.ctx.schema.encrypted());
                    entity.trigger_changed();
                }
                {
                    let mut collection = self.ctx.collection.borrow_mut();
                    collection.trigger_changed();
                    if self.mode.inserts_entity() {
                        collection.sync_after_create(self.handle.clone());
                    }
                }
                tracing::info!(
                    "Saved '{}' in '{}'",
                    self.handle.name().unwrap_or_default(),
                    self.ctx.schema.name()
                );
                self.close();
                Ok(SaveOutcome::Committed)
            }
            Err(failure) => {
                transaction.rollback(&self.handle)?;
                let message = failure.display_message();
                tracing::warn!(
                    "Save in '{}' failed and was rolled back: {}",
                    self.ctx.schema.name(),
                    failure
                );

                self.submit_enabled = true;
                if self.phase == DialogPhase::Saving {
                    self.phase = DialogPhase::Open;
                }
                let session = self.session;
                self.ctx.prompts.clear_saving(session);
                self.ctx.prompts.show_error(session, message.clone());
                self.ctx.prompts.add_click_listener(session);
                Ok(SaveOutcome::RolledBack { message })
            }
        }
    }

    /// Save and wait for the store
    pub async fn submit(&mut self) -> DialogResult<SaveOutcome> {
        match self.begin_save() {
            SaveStart::Done(outcome) => Ok(outcome),
            SaveStart::Pending(pending) => {
                let outcome = pending.wait().await;
                self.finish_save(outcome)
            }
        }
    }

    // ========================================================================
    // Close
    // ========================================================================

    /// Handle a click inside the dialog
    pub fn dismiss_prompts(&self) -> bool {
        self.ctx.prompts.dismiss(self.session)
    }

    /// Close the dialog; an in-flight save keeps running
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.phase = DialogPhase::Closed;
        self.draft.clear_listeners();
        self.ctx.prompts.close_session(self.session);
        tracing::info!("Closed dialog session {}", self.session);
    }

    /// Close without saving
    pub fn cancel(&mut self) {
        tracing::debug!("Cancelled dialog session {}", self.session);
        self.close();
    }

    /// Whether the draft differs from the entity's content
    pub fn is_dirty(&self) -> bool {
        let content = self.handle.content();
        self.draft.values().iter().any(|(k, v)| {
            let saved = content.get(k);
            saved != Some(v) && !(is_blank(Some(v)) && is_blank(saved))
        })
    }
}

impl Drop for EntityDialog {
    fn drop(&mut self) {
        self.ctx.prompts.close_session(self.session);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::store::EntityStore;
    use crate::transport::PersistenceFailure;
    use confdesk_schema::FieldDescriptor;
    use serde_json::json;
    use tokio_test::block_on;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    fn account() -> ComponentConfig {
        ComponentConfig::new("account", "Account")
            .with_field(FieldDescriptor::new("name", "Name").with_default(""))
            .with_field(FieldDescriptor::new("port", "Port").with_default(8089))
            .with_field(FieldDescriptor::new("host", "Host"))
            .with_field(FieldDescriptor::new("secret", "Secret").encrypted())
            .with_field(FieldDescriptor::new("auth", "Auth"))
            .with_field(FieldDescriptor::new("token", "Token").hidden_until_shown())
    }

    struct Fixture {
        store: EntityStore,
        collection: SharedCollection,
        prompts: PromptBoard,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: EntityStore::new(),
                collection: Collection::new("account").shared(),
                prompts: PromptBoard::new(),
            }
        }

        fn with_entities(entities: &[(&str, Value)]) -> Self {
            let fixture = Self::new();
            for (name, content) in entities {
                fixture.store.insert("account", name, attrs(content.clone()));
            }
            *fixture.collection.borrow_mut() =
                Collection::from_entities("account", fixture.store.list("account"));
            fixture
        }

        fn context(&self, component: &ComponentConfig) -> DialogContext {
            DialogContext::resolve(
                component,
                &HookRegistry::with_builtins(),
                self.collection.clone(),
                Rc::new(self.store.clone()),
                self.prompts.clone(),
            )
            .unwrap()
        }

        fn entity(&self, name: &str) -> EntityHandle {
            self.collection.borrow().find(name).unwrap()
        }
    }

    #[test]
    fn test_create_applies_defaults() {
        let component = ComponentConfig::new("account", "Account")
            .with_field(FieldDescriptor::new("name", "Name").with_default(""))
            .with_field(FieldDescriptor::new("port", "Port").with_default(8089));
        let fixture = Fixture::new();

        let dialog = EntityDialog::open(DialogRequest::Create, fixture.context(&component)).unwrap();

        assert_eq!(dialog.draft().values(), &attrs(json!({"name": "", "port": 8089})));
        assert!(!dialog.handle().borrow().has_identity());
    }

    #[test]
    fn test_edit_strips_encrypted_fields() {
        let fixture = Fixture::with_entities(&[("acct1", json!({"secret": "xyz", "host": "h"}))]);
        let handle = fixture.entity("acct1");

        let dialog =
            EntityDialog::open(DialogRequest::Edit(handle.clone()), fixture.context(&account()))
                .unwrap();

        assert_eq!(dialog.draft().get("name"), Some(&json!("acct1")));
        assert!(!dialog.draft().contains("secret"));
        assert!(handle.get("secret").is_none());
        assert!(dialog.handle().ptr_eq(&handle));
    }

    #[test]
    fn test_clone_strips_identity_and_ref_count() {
        let component = ComponentConfig::new("account", "Account")
            .with_field(FieldDescriptor::new("name", "Name"))
            .with_field(FieldDescriptor::new("host", "Host"));
        let fixture = Fixture::with_entities(&[("acct1", json!({"refCount": 3, "host": "h1"}))]);
        let source = fixture.entity("acct1");

        let mut dialog =
            EntityDialog::open(DialogRequest::Clone(source.clone()), fixture.context(&component))
                .unwrap();

        assert_eq!(dialog.draft().values(), &attrs(json!({"host": "h1"})));
        assert!(!dialog.handle().ptr_eq(&source));
        assert_eq!(dialog.clone_source(), Some("acct1"));

        let view = dialog.render();
        assert_eq!(view.template.title, "Clone Account");
        assert_eq!(view.template.name.as_deref(), Some("acct1"));
        assert_eq!(view.template.is_input, None);
        assert!(!view.control("name").unwrap().readonly);
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let component = ComponentConfig::new("account", "Account")
            .with_field(FieldDescriptor::new("name", "Name"))
            .with_field(FieldDescriptor::new("port", "Port"));
        let fixture = Fixture::with_entities(&[("a", json!({"port": 1}))]);
        let handle = fixture.entity("a");
        fixture
            .store
            .fail_next(PersistenceFailure::rest(500, "Backend unavailable"));

        let mut dialog =
            EntityDialog::open(DialogRequest::Edit(handle.clone()), fixture.context(&component))
                .unwrap();
        dialog.set_field("port", 2).unwrap();
        let outcome = block_on(dialog.submit()).unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::RolledBack {
                message: "Backend unavailable".to_string()
            }
        );
        assert_eq!(handle.content(), attrs(json!({"name": "a", "port": 1})));
        assert!(dialog.submit_enabled());
        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert_eq!(dialog.draft().get("port"), Some(&json!(2)));

        let prompt = dialog.prompt();
        assert_eq!(prompt.error.as_deref(), Some("Backend unavailable"));
        assert!(prompt.saving.is_none());
        assert!(prompt.dismiss_armed);
    }

    #[test]
    fn test_resubmit_after_failure() {
        let fixture = Fixture::with_entities(&[("a", json!({"port": 1}))]);
        fixture.store.fail_next(PersistenceFailure::new(503, "busy"));

        let mut dialog = EntityDialog::open(
            DialogRequest::Edit(fixture.entity("a")),
            fixture.context(&account()),
        )
        .unwrap();
        dialog.set_field("port", 2).unwrap();

        assert!(matches!(
            block_on(dialog.submit()).unwrap(),
            SaveOutcome::RolledBack { .. }
        ));
        assert_eq!(block_on(dialog.submit()).unwrap(), SaveOutcome::Committed);
        assert_eq!(fixture.store.get("account", "a").unwrap().get("port"), Some(&json!(2)));
        assert!(dialog.is_closed());
    }

    #[test]
    fn test_creates_update_pagination() {
        let fixture = Fixture::new();
        for i in 0..3 {
            let mut dialog =
                EntityDialog::open(DialogRequest::Create, fixture.context(&account())).unwrap();
            dialog.set_field("name", format!("acct{}", i)).unwrap();
            assert_eq!(block_on(dialog.submit()).unwrap(), SaveOutcome::Committed);
        }

        let collection = fixture.collection.borrow();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.pagination().total, 3);
        assert!(collection.entities().iter().all(|e| e.pagination().total == 3));
        assert_eq!(fixture.store.count("account"), 3);
        assert_eq!(fixture.prompts.session_count(), 0);
    }

    #[test]
    fn test_encrypted_stripped_after_save() {
        let fixture = Fixture::with_entities(&[("acct1", json!({"secret": "old"}))]);
        let handle = fixture.entity("acct1");

        let mut dialog =
            EntityDialog::open(DialogRequest::Edit(handle.clone()), fixture.context(&account()))
                .unwrap();
        dialog.set_field("secret", "new").unwrap();
        assert_eq!(block_on(dialog.submit()).unwrap(), SaveOutcome::Committed);

        assert!(handle.get("secret").is_none());
        assert_eq!(
            fixture.store.get("account", "acct1").unwrap().get("secret"),
            Some(&json!("new"))
        );
        // edit does not insert a second copy
        assert_eq!(fixture.collection.borrow().len(), 1);
    }

    #[test]
    fn test_edit_keeps_stored_secret() {
        let fixture = Fixture::with_entities(&[("a", json!({"port": 1, "secret": "s3cr3t"}))]);
        let handle = fixture.entity("a");

        let mut dialog =
            EntityDialog::open(DialogRequest::Edit(handle.clone()), fixture.context(&account()))
                .unwrap();
        dialog.set_field("port", 2).unwrap();
        assert_eq!(block_on(dialog.submit()).unwrap(), SaveOutcome::Committed);

        let stored = fixture.store.get("account", "a").unwrap();
        assert_eq!(stored.get("port"), Some(&json!(2)));
        assert_eq!(stored.get("secret"), Some(&json!("s3cr3t")));
        assert!(handle.get("secret").is_none());
    }

    #[test]
    fn test_create_without_name_is_rejected() {
        let fixture = Fixture::new();
        let mut dialog =
            EntityDialog::open(DialogRequest::Create, fixture.context(&account())).unwrap();

        let outcome = block_on(dialog.submit()).unwrap();
        let SaveOutcome::Invalid(result) = outcome else {
            panic!("expected validation failure, got {:?}", outcome);
        };
        assert_eq!(result.errors[0].code, ValidationErrorCode::MissingIdentity);
        assert_eq!(fixture.store.count("account"), 0);
        assert!(dialog.submit_enabled());
        assert!(dialog.handle().content().is_empty());

        let view = dialog.view();
        assert_eq!(
            view.control("name").unwrap().error.as_deref(),
            Some("Field Name is required")
        );
        assert!(dialog.dismiss_prompts());
        assert!(dialog.view().control("name").unwrap().error.is_none());
    }

    #[test]
    fn test_save_validator_rejects_form() {
        let component = account().with_save_validator("require_one_of(secret, token)");
        let fixture = Fixture::new();
        let mut dialog =
            EntityDialog::open(DialogRequest::Create, fixture.context(&component)).unwrap();
        dialog.set_field("name", "acct").unwrap();

        let outcome = block_on(dialog.submit()).unwrap();
        assert!(matches!(outcome, SaveOutcome::Invalid(_)));
        assert_eq!(
            dialog.view().form_errors,
            vec!["At least one of secret, token is required".to_string()]
        );

        dialog.set_field("token", "t").unwrap();
        assert_eq!(block_on(dialog.submit()).unwrap(), SaveOutcome::Committed);
    }

    #[test]
    fn test_transport_not_initiated() {
        let fixture = Fixture::with_entities(&[("a", json!({"port": 1}))]);
        let handle = fixture.entity("a");
        fixture.store.set_offline(true);

        let mut dialog =
            EntityDialog::open(DialogRequest::Edit(handle.clone()), fixture.context(&account()))
                .unwrap();
        dialog.set_field("port", 9).unwrap();
        let revision = handle.revision();

        assert_eq!(block_on(dialog.submit()).unwrap(), SaveOutcome::NotInitiated);
        assert_eq!(handle.get("port"), Some(json!(1)));
        assert_eq!(handle.revision(), revision + 1);
        assert!(dialog.submit_enabled());
        assert_eq!(dialog.phase(), DialogPhase::Open);
    }

    #[test]
    fn test_second_submit_ignored_while_saving() {
        let fixture = Fixture::new();
        fixture.store.hold_completions(true);
        let mut dialog =
            EntityDialog::open(DialogRequest::Create, fixture.context(&account())).unwrap();
        dialog.set_field("name", "acct").unwrap();

        let SaveStart::Pending(mut pending) = dialog.begin_save() else {
            panic!("save should be pending");
        };
        assert_eq!(dialog.phase(), DialogPhase::Saving);
        assert_eq!(dialog.prompt().saving.as_deref(), Some("Saving"));
        assert!(matches!(
            dialog.begin_save(),
            SaveStart::Done(SaveOutcome::Ignored)
        ));

        fixture.store.release_held();
        let outcome = pending.try_take().unwrap();
        assert_eq!(dialog.finish_save(outcome).unwrap(), SaveOutcome::Committed);
        assert!(dialog.finish_save(Ok(SavedEntity::new("x", Attributes::new()))).is_err());
    }

    #[test]
    fn test_completion_after_close_still_reconciles() {
        let fixture = Fixture::new();
        fixture.store.hold_completions(true);
        let mut dialog =
            EntityDialog::open(DialogRequest::Create, fixture.context(&account())).unwrap();
        dialog.set_field("name", "late").unwrap();

        let SaveStart::Pending(mut pending) = dialog.begin_save() else {
            panic!("save should be pending");
        };
        dialog.close();
        assert_eq!(fixture.prompts.session_count(), 0);

        fixture.store.release_held();
        let outcome = dialog.finish_save(pending.try_take().unwrap()).unwrap();

        assert_eq!(outcome, SaveOutcome::Committed);
        assert_eq!(fixture.collection.borrow().len(), 1);
        assert_eq!(fixture.prompts.session_count(), 0);
    }

    #[test]
    fn test_failure_after_close_rolls_back_silently() {
        let fixture = Fixture::with_entities(&[("a", json!({"port": 1}))]);
        let handle = fixture.entity("a");
        fixture.store.hold_completions(true);
        fixture.store.fail_next(PersistenceFailure::new(500, "boom"));

        let mut dialog =
            EntityDialog::open(DialogRequest::Edit(handle.clone()), fixture.context(&account()))
                .unwrap();
        dialog.set_field("port", 2).unwrap();
        let SaveStart::Pending(mut pending) = dialog.begin_save() else {
            panic!("save should be pending");
        };
        assert_eq!(handle.get("port"), Some(json!(2)));

        dialog.cancel();
        fixture.store.release_held();
        let outcome = dialog.finish_save(pending.try_take().unwrap()).unwrap();

        assert!(matches!(outcome, SaveOutcome::RolledBack { .. }));
        assert_eq!(handle.get("port"), Some(json!(1)));
        assert!(dialog.is_closed());
        assert!(fixture.prompts.state(dialog.session()).is_none());
    }

    #[test]
    fn test_on_change_hook_toggles_controls() {
        let component = account().with_on_change("show_when(auth, oauth, token)");
        let fixture = Fixture::new();
        let mut dialog =
            EntityDialog::open(DialogRequest::Create, fixture.context(&component)).unwrap();

        assert!(!dialog.control_state("#account-token").unwrap().visible);

        dialog.set_field("auth", "oauth").unwrap();
        assert!(dialog.view().control("token").unwrap().visible);

        dialog.set_field("auth", "basic").unwrap();
        assert!(!dialog.view().control("token").unwrap().visible);
    }

    #[test]
    fn test_on_load_hook_runs_once() {
        let component = account().with_on_load("show_when(auth, oauth, token)");
        let fixture = Fixture::with_entities(&[("acct1", json!({"auth": "oauth"}))]);

        let dialog = EntityDialog::open(
            DialogRequest::Edit(fixture.entity("acct1")),
            fixture.context(&component),
        )
        .unwrap();
        assert!(dialog.control_state("#account-token").unwrap().visible);
    }

    #[test]
    fn test_edit_name_is_read_only() {
        let fixture = Fixture::with_entities(&[("acct1", json!({}))]);
        let mut dialog = EntityDialog::open(
            DialogRequest::Edit(fixture.entity("acct1")),
            fixture.context(&account()),
        )
        .unwrap();

        assert!(dialog.set_field("name", "renamed").is_err());
        let view = dialog.render();
        assert!(view.control("name").unwrap().readonly);
        assert_eq!(view.template.title, "Edit Account");
        assert_eq!(view.template.is_input, Some(false));
    }

    #[test]
    fn test_render_reapplies_defaults() {
        let fixture = Fixture::new();
        let mut dialog =
            EntityDialog::open(DialogRequest::Create, fixture.context(&account())).unwrap();

        dialog.unset_field("port").unwrap();
        assert!(!dialog.draft().contains("port"));

        let view = dialog.render();
        assert_eq!(view.control("port").unwrap().value, json!(8089));
        assert_eq!(view.template.title, "Add Account");
        assert_eq!(view.session_class, dialog.session().class_name());
    }

    #[test]
    fn test_schema_error_blocks_open() {
        let fixture = Fixture::new();
        let result = DialogContext::resolve(
            &account().with_on_change("undefined_hook"),
            &HookRegistry::with_builtins(),
            fixture.collection.clone(),
            Rc::new(fixture.store.clone()),
            fixture.prompts.clone(),
        );
        assert!(result.unwrap_err().is_schema());
    }

    #[test]
    fn test_closed_dialog_rejects_edits() {
        let fixture = Fixture::new();
        let mut dialog =
            EntityDialog::open(DialogRequest::Create, fixture.context(&account())).unwrap();
        dialog.cancel();
        assert!(dialog.set_field("host", "h").is_err());
        assert!(matches!(
            dialog.begin_save(),
            SaveStart::Done(SaveOutcome::Ignored)
        ));
    }
}
