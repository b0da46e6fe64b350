//! Application State Management for Confdesk
//!
//! Centralized state for the desktop shell using Dioxus 0.7 Signals: the
//! loaded console, the selected component, the open dialog and the status
//! line.

use dioxus::prelude::*;
use std::path::PathBuf;

use crate::console::{ComponentTable, Console};
use crate::controller::{DialogPhase, EntityDialog, SaveOutcome, SaveStart};
use crate::delete::{DeleteDialog, DeleteOutcome, DeleteStart};
use crate::entity::SavedEntity;
use crate::store::EntityStore;
use crate::transport::Outcome;
use confdesk_core::{DialogError, DialogResult, LifecycleMode, SessionId};
use confdesk_schema::{AppConfig, HookRegistry};

// ============================================================================
// Startup
// ============================================================================

/// What the desktop shell is launched with
#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub config: AppConfig,
    /// JSON store file; in-memory when absent
    pub store_path: Option<PathBuf>,
}

// ============================================================================
// Status Line
// ============================================================================

/// Status message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusLevel {
    /// Tailwind text color for this level
    pub fn text_class(&self) -> &'static str {
        match self {
            StatusLevel::Info => "text-slate-300",
            StatusLevel::Success => "text-emerald-400",
            StatusLevel::Warning => "text-amber-400",
            StatusLevel::Error => "text-rose-400",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

// ============================================================================
// Open Dialog
// ============================================================================

/// The dialog shown over the table
#[derive(Debug)]
pub enum ActiveDialog {
    Entity(EntityDialog),
    Delete(DeleteDialog),
}

// ============================================================================
// Workbench
// ============================================================================

/// Root state of the desktop shell
#[derive(Debug, Default)]
pub struct Workbench {
    /// Loaded console, if loading succeeded
    pub console: Option<Console>,
    /// Component whose table is shown
    pub active_component: Option<String>,
    pub dialog: Option<ActiveDialog>,
    /// Closed entity dialogs whose save is still in flight
    pub detached: Vec<EntityDialog>,
    pub status: Option<StatusMessage>,
}

impl Workbench {
    /// Create an empty workbench
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the console described by `options`
    pub fn load(&mut self, options: &StartupOptions) -> DialogResult<()> {
        let store = match &options.store_path {
            Some(path) => EntityStore::open(path)?,
            None => EntityStore::new(),
        };
        let console = Console::load(
            options.config.clone(),
            store,
            &HookRegistry::with_builtins(),
        )?;

        self.active_component = console.tables().first().map(|t| t.name().to_string());
        self.set_status(
            format!("Loaded {}", console.config().display_name()),
            StatusLevel::Info,
        );
        self.console = Some(console);
        self.dialog = None;
        Ok(())
    }

    fn console(&self) -> DialogResult<&Console> {
        self.console
            .as_ref()
            .ok_or_else(|| DialogError::invalid_state("no console loaded"))
    }

    /// The selected component's table
    pub fn active_table(&self) -> Option<&ComponentTable> {
        let console = self.console.as_ref()?;
        let name = self.active_component.as_deref()?;
        console.table(name).ok()
    }

    pub fn select_component(&mut self, name: impl Into<String>) {
        self.active_component = Some(name.into());
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
        });
    }

    fn active_name(&self) -> DialogResult<String> {
        self.active_component
            .clone()
            .ok_or_else(|| DialogError::invalid_state("no component selected"))
    }

    // ========================================================================
    // Dialogs
    // ========================================================================

    /// Open an add / edit / clone dialog on the active component
    pub fn open_entity_dialog(&mut self, mode: LifecycleMode, name: Option<&str>) {
        let result = self
            .active_name()
            .and_then(|component| self.console()?.open_entity_dialog(&component, mode, name));
        match result {
            Ok(dialog) => self.dialog = Some(ActiveDialog::Entity(dialog)),
            Err(e) => {
                tracing::error!("Failed to open dialog: {}", e);
                self.set_status(format!("Cannot open dialog: {}", e), StatusLevel::Error);
            }
        }
    }

    /// Open the delete confirmation for an entity of the active component
    pub fn open_delete_dialog(&mut self, name: &str) {
        let result = self
            .active_name()
            .and_then(|component| self.console()?.open_delete_dialog(&component, name));
        match result {
            Ok(dialog) => self.dialog = Some(ActiveDialog::Delete(dialog)),
            Err(e) => {
                tracing::error!("Failed to open delete dialog: {}", e);
                self.set_status(format!("Cannot delete: {}", e), StatusLevel::Error);
            }
        }
    }

    /// Close whatever dialog is open
    pub fn close_dialog(&mut self) {
        match self.dialog.take() {
            Some(ActiveDialog::Entity(mut dialog)) => {
                let saving = dialog.phase() == DialogPhase::Saving;
                dialog.cancel();
                if saving {
                    self.detached.push(dialog);
                }
            }
            Some(ActiveDialog::Delete(mut dialog)) => dialog.close(),
            None => {}
        }
    }

    /// Start saving the open entity dialog
    pub fn begin_save(&mut self) -> Option<(SessionId, SaveStart)> {
        match &mut self.dialog {
            Some(ActiveDialog::Entity(dialog)) => Some((dialog.session(), dialog.begin_save())),
            _ => None,
        }
    }

    /// Apply a save outcome to the dialog of `session`
    ///
    /// A dialog closed while saving still gets its outcome so the entity
    /// and collection are reconciled.
    pub fn finish_save(&mut self, session: SessionId, outcome: Outcome<SavedEntity>) {
        if let Some(index) = self.detached.iter().position(|d| d.session() == session) {
            let mut dialog = self.detached.remove(index);
            match dialog.finish_save(outcome) {
                Ok(outcome) => tracing::debug!("Late save for session {}: {:?}", session, outcome),
                Err(e) => tracing::error!("Failed to apply late save outcome: {}", e),
            }
            return;
        }

        let Some(ActiveDialog::Entity(dialog)) = &mut self.dialog else {
            tracing::debug!("Save completed with no entity dialog open");
            return;
        };
        if dialog.session() != session {
            tracing::debug!("Save completion for unknown session {}", session);
            return;
        }
        match dialog.finish_save(outcome) {
            Ok(SaveOutcome::Committed) => {
                let name = dialog.handle().name().unwrap_or_default();
                self.dialog = None;
                self.set_status(format!("Saved '{}'", name), StatusLevel::Success);
            }
            Ok(SaveOutcome::RolledBack { message }) => {
                self.set_status(format!("Save failed: {}", message), StatusLevel::Error);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to apply save outcome: {}", e);
                self.set_status(e.to_string(), StatusLevel::Error);
            }
        }
    }

    /// Report a save that finished without reaching the store
    pub fn report_save(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::NotInitiated => {
                self.set_status("The store is unavailable", StatusLevel::Warning)
            }
            SaveOutcome::Invalid(_) => {
                self.set_status("Fix the highlighted fields", StatusLevel::Warning)
            }
            _ => {}
        }
    }

    /// Start the open delete dialog
    pub fn begin_delete(&mut self) -> Option<DeleteStart> {
        match &mut self.dialog {
            Some(ActiveDialog::Delete(dialog)) => Some(dialog.begin_delete()),
            _ => None,
        }
    }

    /// Apply a delete outcome to the open delete dialog
    pub fn finish_delete(&mut self, outcome: Outcome<()>) {
        let Some(ActiveDialog::Delete(dialog)) = &mut self.dialog else {
            tracing::debug!("Delete completed with no delete dialog open");
            return;
        };
        let Some(console) = self.console.as_mut() else {
            return;
        };
        let name = dialog.name().to_string();
        let result = console
            .table_mut(self.active_component.as_deref().unwrap_or_default())
            .and_then(|table| dialog.finish_delete(outcome, &mut table.page));
        match result {
            Ok(DeleteOutcome::Deleted) => {
                self.dialog = None;
                self.set_status(format!("Deleted '{}'", name), StatusLevel::Success);
            }
            Ok(DeleteOutcome::Failed { message }) => {
                self.set_status(format!("Delete failed: {}", message), StatusLevel::Error);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to apply delete outcome: {}", e);
                self.set_status(e.to_string(), StatusLevel::Error);
            }
        }
    }
}

// ============================================================================
// Global State
// ============================================================================

/// Global workbench signal
pub static WORKBENCH: GlobalSignal<Workbench> = Signal::global(Workbench::new);
