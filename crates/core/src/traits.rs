//! Core traits for Confdesk
//!
//! This module defines the behaviors shared across the workspace:
//! validation of configuration structures and the three hook capabilities
//! a component may declare.
//!
//! Hooks are resolved once, when a component is loaded, and then called
//! with everything they may touch passed in explicitly. They never see
//! the dialog, the collection, or the store.

use crate::error::DialogResult;
use crate::types::{Attributes, ControlCommands, WidgetIds};

// ============================================================================
// Validatable Trait
// ============================================================================

/// Structural validation of loaded configuration
///
/// Components, field descriptors and whole console configurations check
/// their own consistency before anything is resolved from them.
///
/// # Example
///
/// ```rust,ignore
/// use confdesk_core::{Validatable, DialogResult, DialogError};
///
/// struct Tab {
///     name: String,
/// }
///
/// impl Validatable for Tab {
///     fn validate(&self) -> DialogResult<()> {
///         if self.name.is_empty() {
///             return Err(DialogError::validation("Name cannot be empty"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Check the value
    ///
    /// Returns `Ok(())` if valid, or a `DialogError` describing the problem.
    fn validate(&self) -> DialogResult<()>;

    /// `validate().is_ok()`
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Every validation message, for display
    fn validation_errors(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => vec![],
            Err(e) => vec![e.to_string()],
        }
    }
}

// ============================================================================
// Hook Capabilities
// ============================================================================

/// Called after every draft mutation
///
/// Receives the full draft snapshot, the attributes changed by this
/// mutation, and the widget id of every field's control. It may issue
/// control commands; anything else it computes is discarded.
pub trait OnChangeHook {
    fn on_change(
        &self,
        form: &Attributes,
        changed: &Attributes,
        widgets: &WidgetIds,
        controls: &mut ControlCommands,
    );
}

/// Called once after a dialog has seeded its draft
pub trait OnLoadHook {
    fn on_load(&self, form: &Attributes, widgets: &WidgetIds, controls: &mut ControlCommands);
}

/// Form-level validation run before persistence
///
/// Returns a user-facing message when the form must not be saved.
pub trait SaveValidator {
    fn validate(&self, form: &Attributes) -> Result<(), String>;
}

impl<F> OnChangeHook for F
where
    F: Fn(&Attributes, &Attributes, &WidgetIds, &mut ControlCommands),
{
    fn on_change(
        &self,
        form: &Attributes,
        changed: &Attributes,
        widgets: &WidgetIds,
        controls: &mut ControlCommands,
    ) {
        self(form, changed, widgets, controls)
    }
}

impl<F> SaveValidator for F
where
    F: Fn(&Attributes) -> Result<(), String>,
{
    fn validate(&self, form: &Attributes) -> Result<(), String> {
        self(form)
    }
}

// ============================================================================
// Tests
// ============================================================================
