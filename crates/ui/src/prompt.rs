//! Session-scoped prompts
//!
//! Error banners, saving indicators and inline validation messages, keyed
//! by the dialog session that shows them. Operations on a session the
//! board does not know are no-ops, so a completion arriving after its
//! dialog closed cannot touch the screen.

use confdesk_core::messages::MSG_SAVING;
use confdesk_core::{SessionId, formatted_message};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// What one dialog session currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptState {
    /// Error banner
    pub error: Option<String>,
    /// Saving indicator
    pub saving: Option<String>,
    /// Inline message per field
    pub field_errors: BTreeMap<String, String>,
    /// Messages not tied to a field
    pub form_errors: Vec<String>,
    /// Whether a click anywhere in the dialog dismisses the messages
    pub dismiss_armed: bool,
}

impl PromptState {
    /// Whether anything is shown
    pub fn is_clear(&self) -> bool {
        self.error.is_none()
            && self.saving.is_none()
            && self.field_errors.is_empty()
            && self.form_errors.is_empty()
    }
}

/// Prompts of every open dialog session
#[derive(Debug, Clone, Default)]
pub struct PromptBoard {
    sessions: Rc<RefCell<HashMap<SessionId, PromptState>>>,
}

impl PromptBoard {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    pub fn open_session(&self, session: SessionId) {
        self.sessions
            .borrow_mut()
            .insert(session, PromptState::default());
    }

    /// Forget a session; returns whether it was open
    pub fn close_session(&self, session: SessionId) -> bool {
        self.sessions.borrow_mut().remove(&session).is_some()
    }

    pub fn is_open(&self, session: SessionId) -> bool {
        self.sessions.borrow().contains_key(&session)
    }

    /// Copy of what a session shows
    pub fn state(&self, session: SessionId) -> Option<PromptState> {
        self.sessions.borrow().get(&session).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.borrow().len()
    }

    fn update(&self, session: SessionId, op: &str, f: impl FnOnce(&mut PromptState)) {
        match self.sessions.borrow_mut().get_mut(&session) {
            Some(state) => f(state),
            None => tracing::debug!("Ignoring {} for closed session {}", op, session),
        }
    }

    // ========================================================================
    // Indicators
    // ========================================================================

    pub fn show_error(&self, session: SessionId, message: impl Into<String>) {
        let message = message.into();
        self.update(session, "show_error", |s| s.error = Some(message));
    }

    pub fn clear_error(&self, session: SessionId) {
        self.update(session, "clear_error", |s| s.error = None);
    }

    pub fn show_saving(&self, session: SessionId) {
        self.show_progress(session, formatted_message(MSG_SAVING, &[]));
    }

    /// Show a progress indicator with a custom label
    pub fn show_progress(&self, session: SessionId, label: impl Into<String>) {
        let label = label.into();
        self.update(session, "show_saving", |s| s.saving = Some(label));
    }

    pub fn clear_saving(&self, session: SessionId) {
        self.update(session, "clear_saving", |s| s.saving = None);
    }

    /// Show inline field messages and form-level messages
    pub fn display_validation_error(
        &self,
        session: SessionId,
        field_errors: BTreeMap<String, String>,
        form_errors: Vec<String>,
    ) {
        self.update(session, "display_validation_error", |s| {
            s.field_errors = field_errors;
            s.form_errors = form_errors;
        });
    }

    // ========================================================================
    // Dismissal
    // ========================================================================

    /// Arm click-to-dismiss for the session's messages
    pub fn add_click_listener(&self, session: SessionId) {
        self.update(session, "add_click_listener", |s| s.dismiss_armed = true);
    }

    /// Handle a click inside the dialog
    ///
    /// Clears the error banner and validation messages when dismissal is
    /// armed. The saving indicator stays.
    pub fn dismiss(&self, session: SessionId) -> bool {
        let mut dismissed = false;
        self.update(session, "dismiss", |s| {
            if s.dismiss_armed {
                s.error = None;
                s.field_errors.clear();
                s.form_errors.clear();
                s.dismiss_armed = false;
                dismissed = true;
            }
        });
        dismissed
    }
}
