//! Delete confirmation dialog
//!
//! Asks before removing an entity, refuses entities other objects still
//! reference, and repairs the collection's pagination once the store has
//! removed it.

use crate::collection::PageState;
use crate::controller::{DialogContext, DialogPhase};
use crate::entity::EntityHandle;
use crate::transport::{DeleteRequest, Outcome, Pending};
use confdesk_core::messages::{
    MSG_DELETE_CONFIRM, MSG_DELETE_IN_USE, MSG_DELETE_TITLE, MSG_DELETING,
};
use confdesk_core::{
    DialogError, DialogResult, REF_COUNT_ATTRIBUTE, SessionId, Value, formatted_message,
};
use serde::{Deserialize, Serialize};

/// How a delete attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Nothing to do in the current phase
    Ignored,
    /// The entity is referenced elsewhere
    InUse,
    /// The store could not start the operation
    NotInitiated,
    /// Removed; the dialog closed
    Deleted,
    /// The store rejected the delete
    Failed { message: String },
}

/// Result of starting a delete
#[derive(Debug)]
pub enum DeleteStart {
    Done(DeleteOutcome),
    Pending(Pending<()>),
}

/// Everything needed to draw a delete dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteView {
    pub session_class: String,
    pub title: String,
    pub message: String,
    pub in_use: bool,
    pub submit_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whether a reference count marks the entity as in use
fn referenced(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n > 0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().is_ok_and(|n| n > 0.0),
        _ => false,
    }
}

/// Controller of one delete confirmation
#[derive(Debug)]
pub struct DeleteDialog {
    session: SessionId,
    ctx: DialogContext,
    handle: EntityHandle,
    name: String,
    in_use: bool,
    submit_enabled: bool,
    phase: DialogPhase,
}

impl DeleteDialog {
    pub fn open(handle: EntityHandle, ctx: DialogContext) -> DialogResult<Self> {
        let name = handle.name().ok_or_else(|| {
            DialogError::invalid_state("cannot delete an entity that was never saved")
        })?;
        let in_use = referenced(handle.get(REF_COUNT_ATTRIBUTE).as_ref());

        let session = SessionId::new();
        ctx.prompts.open_session(session);
        tracing::info!(
            "Opened delete dialog for '{}' in '{}' (session {})",
            name,
            ctx.schema.name(),
            session
        );

        Ok(Self {
            session,
            ctx,
            handle,
            name,
            in_use,
            submit_enabled: true,
            phase: DialogPhase::Open,
        })
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == DialogPhase::Closed
    }

    pub fn view(&self) -> DeleteView {
        let prompt = self.ctx.prompts.state(self.session).unwrap_or_default();
        let message = if self.in_use {
            formatted_message(MSG_DELETE_IN_USE, &[self.name.as_str()])
        } else {
            formatted_message(MSG_DELETE_CONFIRM, &[self.name.as_str(), self.ctx.schema.title()])
        };
        DeleteView {
            session_class: self.session.class_name(),
            title: formatted_message(MSG_DELETE_TITLE, &[]),
            message,
            in_use: self.in_use,
            submit_enabled: self.submit_enabled && !self.in_use,
            deleting: prompt.saving,
            error: prompt.error,
        }
    }

    /// Start the delete
    pub fn begin_delete(&mut self) -> DeleteStart {
        if self.in_use {
            tracing::debug!("'{}' is in use; not deleting", self.name);
            return DeleteStart::Done(DeleteOutcome::InUse);
        }
        if self.phase != DialogPhase::Open || !self.submit_enabled {
            return DeleteStart::Done(DeleteOutcome::Ignored);
        }

        self.submit_enabled = false;
        self.ctx.prompts.clear_error(self.session);

        let request = DeleteRequest {
            component: self.ctx.schema.name().to_string(),
            name: self.name.clone(),
        };
        match self.ctx.transport.delete(request) {
            None => {
                tracing::warn!("Delete of '{}' could not be started", self.name);
                self.submit_enabled = true;
                DeleteStart::Done(DeleteOutcome::NotInitiated)
            }
            Some(pending) => {
                self.ctx
                    .prompts
                    .show_progress(self.session, formatted_message(MSG_DELETING, &[]));
                self.phase = DialogPhase::Saving;
                DeleteStart::Pending(pending)
            }
        }
    }

    /// Apply the outcome of the delete
    ///
    /// A successful delete removes the entity from the collection even when
    /// the dialog closed in the meantime.
    pub fn finish_delete(
        &mut self,
        outcome: Outcome<()>,
        page: &mut PageState,
    ) -> DialogResult<DeleteOutcome> {
        match outcome {
            Ok(()) => {
                {
                    let mut collection = self.ctx.collection.borrow_mut();
                    collection.sync_after_delete(&self.name, page)?;
                    collection.trigger_changed();
                }
                tracing::info!("Deleted '{}' from '{}'", self.name, self.ctx.schema.name());
                self.close();
                Ok(DeleteOutcome::Deleted)
            }
            Err(failure) => {
                let message = failure.display_message();
                tracing::warn!("Delete of '{}' failed: {}", self.name, failure);
                self.submit_enabled = true;
                if self.phase == DialogPhase::Saving {
                    self.phase = DialogPhase::Open;
                }
                self.ctx.prompts.clear_saving(self.session);
                self.ctx.prompts.show_error(self.session, message.clone());
                self.ctx.prompts.add_click_listener(self.session);
                Ok(DeleteOutcome::Failed { message })
            }
        }
    }

    /// Delete and wait for the store
    pub async fn confirm(&mut self, page: &mut PageState) -> DialogResult<DeleteOutcome> {
        match self.begin_delete() {
            DeleteStart::Done(outcome) => Ok(outcome),
            DeleteStart::Pending(pending) => {
                let outcome = pending.wait().await;
                self.finish_delete(outcome, page)
            }
        }
    }

    pub fn dismiss_prompts(&self) -> bool {
        self.ctx.prompts.dismiss(self.session)
    }

    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.phase = DialogPhase::Closed;
        self.ctx.prompts.close_session(self.session);
        tracing::info!("Closed delete dialog session {}", self.session);
    }
}

impl Drop for DeleteDialog {
    fn drop(&mut self) {
        self.ctx.prompts.close_session(self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Collection, SharedCollection};
    use crate::prompt::PromptBoard;
    use crate::store::EntityStore;
    use crate::transport::PersistenceFailure;
    use confdesk_core::Pagination;
    use confdesk_schema::{ComponentConfig, FieldDescriptor, HookRegistry};
    use serde_json::json;
    use std::rc::Rc;
    use tokio_test::block_on;

    fn setup(entities: &[(&str, Value)]) -> (EntityStore, SharedCollection, DialogContext) {
        let store = EntityStore::new();
        for (name, content) in entities {
            store.insert("account", name, content.as_object().cloned().unwrap());
        }
        let collection = Collection::from_entities("account", store.list("account")).shared();
        let component = ComponentConfig::new("account", "Account")
            .with_field(FieldDescriptor::new("name", "Name"));
        let ctx = DialogContext::resolve(
            &component,
            &HookRegistry::new(),
            collection.clone(),
            Rc::new(store.clone()),
            PromptBoard::new(),
        )
        .unwrap();
        (store, collection, ctx)
    }

    #[test]
    fn test_in_use_entity_is_refused() {
        let (store, collection, ctx) = setup(&[("a", json!({"refCount": 2}))]);
        let handle = collection.borrow().find("a").unwrap();
        let mut dialog = DeleteDialog::open(handle, ctx).unwrap();

        let view = dialog.view();
        assert!(view.in_use);
        assert!(!view.submit_enabled);
        assert_eq!(view.message, "a cannot be deleted because it is in use");

        let outcome = block_on(dialog.confirm(&mut PageState::default())).unwrap();
        assert_eq!(outcome, DeleteOutcome::InUse);
        assert_eq!(store.count("account"), 1);
    }

    #[test]
    fn test_confirm_removes_entity() {
        let (store, collection, ctx) = setup(&[("a", json!({})), ("b", json!({"refCount": "0"}))]);
        let handle = collection.borrow().find("b").unwrap();
        let mut dialog = DeleteDialog::open(handle, ctx).unwrap();

        assert_eq!(dialog.view().title, "Delete Confirmation");
        assert_eq!(
            dialog.view().message,
            "Are you sure you want to delete \"b\" Account?"
        );

        let mut page = PageState::default();
        let outcome = block_on(dialog.confirm(&mut page)).unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(dialog.is_closed());
        assert_eq!(store.count("account"), 1);
        let collection = collection.borrow();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.pagination().total, 1);
        assert_eq!(collection.entities()[0].pagination().total, 1);
    }

    #[test]
    fn test_deleting_last_on_page_steps_back() {
        let (_store, collection, ctx) = setup(&[("k", json!({}))]);
        let handle = collection.borrow().find("k").unwrap();
        let mut dialog = DeleteDialog::open(handle, ctx).unwrap();

        let mut page = PageState::new(20, 10);
        block_on(dialog.confirm(&mut page)).unwrap();

        assert_eq!(page.offset, 10);
        assert_eq!(collection.borrow().pagination(), Pagination::new(10, 10, 20));
    }

    #[test]
    fn test_failed_delete_keeps_dialog_open() {
        let (store, collection, ctx) = setup(&[("a", json!({}))]);
        store.fail_next(PersistenceFailure::rest(500, "Backend unavailable"));
        let handle = collection.borrow().find("a").unwrap();
        let mut dialog = DeleteDialog::open(handle, ctx).unwrap();

        let outcome = block_on(dialog.confirm(&mut PageState::default())).unwrap();

        assert_eq!(
            outcome,
            DeleteOutcome::Failed {
                message: "Backend unavailable".to_string()
            }
        );
        assert_eq!(dialog.phase(), DialogPhase::Open);
        let view = dialog.view();
        assert!(view.submit_enabled);
        assert!(view.deleting.is_none());
        assert_eq!(view.error.as_deref(), Some("Backend unavailable"));
        assert_eq!(collection.borrow().len(), 1);
    }

    #[test]
    fn test_deleting_indicator_while_pending() {
        let (store, collection, ctx) = setup(&[("a", json!({}))]);
        store.hold_completions(true);
        let handle = collection.borrow().find("a").unwrap();
        let mut dialog = DeleteDialog::open(handle, ctx).unwrap();

        let DeleteStart::Pending(mut pending) = dialog.begin_delete() else {
            panic!("delete should be pending");
        };
        assert_eq!(dialog.view().deleting.as_deref(), Some("Deleting"));
        assert!(matches!(
            dialog.begin_delete(),
            DeleteStart::Done(DeleteOutcome::Ignored)
        ));

        dialog.close();
        store.release_held();
        let outcome = dialog
            .finish_delete(pending.try_take().unwrap(), &mut PageState::default())
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(collection.borrow().is_empty());
    }

    #[test]
    fn test_offline_delete_not_initiated() {
        let (store, collection, ctx) = setup(&[("a", json!({}))]);
        store.set_offline(true);
        let handle = collection.borrow().find("a").unwrap();
        let mut dialog = DeleteDialog::open(handle, ctx).unwrap();

        assert!(matches!(
            dialog.begin_delete(),
            DeleteStart::Done(DeleteOutcome::NotInitiated)
        ));
        assert!(dialog.view().submit_enabled);
    }
}
