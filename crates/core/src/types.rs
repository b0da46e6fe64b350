//! Core types used throughout Confdesk
//!
//! This module contains the value model shared by the schema resolver,
//! the dialog controllers and the widget layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Attribute Values
// ============================================================================

/// A single attribute value (any JSON value)
pub type Value = serde_json::Value;

/// An attribute bag: field name to value
pub type Attributes = serde_json::Map<String, Value>;

/// Map from field name to the widget identifier of its rendered control
pub type WidgetIds = BTreeMap<String, String>;

/// Attribute holding an entity's identity
pub const NAME_ATTRIBUTE: &str = "name";

/// Attribute holding how many inputs reference an entity
pub const REF_COUNT_ATTRIBUTE: &str = "refCount";

/// Check whether an attribute value counts as "set" for form purposes
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Render a value the way a text control would show it
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Lifecycle Mode
// ============================================================================

/// How a dialog seeds its draft and persisted entity
///
/// Fixed for the lifetime of a dialog session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleMode {
    /// Create a new entity from an empty draft
    Create,
    /// Edit an existing entity in place
    Edit,
    /// Create a new entity seeded from an existing one
    Clone,
}

impl LifecycleMode {
    /// Whether the dialog ends up inserting a new entity into its collection
    pub fn inserts_entity(&self) -> bool {
        !matches!(self, LifecycleMode::Edit)
    }

    /// Whether the entity identity can be changed in this mode
    pub fn identity_editable(&self) -> bool {
        !matches!(self, LifecycleMode::Edit)
    }

    /// Parse a mode from its lowercase name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" | "add" | "new" => Some(LifecycleMode::Create),
            "edit" => Some(LifecycleMode::Edit),
            "clone" => Some(LifecycleMode::Clone),
            _ => None,
        }
    }
}

impl std::fmt::Display for LifecycleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleMode::Create => write!(f, "create"),
            LifecycleMode::Edit => write!(f, "edit"),
            LifecycleMode::Clone => write!(f, "clone"),
        }
    }
}

// ============================================================================
// Session Identifier
// ============================================================================

/// Unique identifier of one open dialog
///
/// Every UI-affecting operation is scoped by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh session id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The class name attached to the dialog's root element
    pub fn class_name(&self) -> String {
        self.0.simple().to_string()
    }

    /// CSS-style selector targeting the dialog
    pub fn selector(&self) -> String {
        format!(".{}", self.class_name())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Pagination descriptor attached to a collection and to each loaded entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub offset: usize,
    pub per_page: usize,
    pub total: usize,
}

impl Pagination {
    /// Create a new pagination descriptor
    pub fn new(offset: usize, per_page: usize, total: usize) -> Self {
        Self {
            offset,
            per_page,
            total,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            per_page: 10,
            total: 0,
        }
    }
}

// ============================================================================
// Draft Events
// ============================================================================

/// One attribute change on a draft model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChanged {
    pub field: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

impl FieldChanged {
    /// Create a change event
    pub fn new(field: impl Into<String>, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        Self {
            field: field.into(),
            old_value,
            new_value,
        }
    }

    /// Whether this change removed the attribute
    pub fn is_unset(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Collect a batch of changes into `field -> new value` (removals map to null)
pub fn changed_attributes(changes: &[FieldChanged]) -> Attributes {
    changes
        .iter()
        .map(|c| (c.field.clone(), c.new_value.clone().unwrap_or(Value::Null)))
        .collect()
}

// ============================================================================
// Control Commands
// ============================================================================

/// What a hook asks the widget layer to do with a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Show,
    Hide,
    Enable,
    Disable,
}

/// A single command targeting a control by widget id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub widget_id: String,
    pub action: ControlAction,
}

/// Sink a hook writes control commands into
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlCommands {
    commands: Vec<ControlCommand>,
}

impl ControlCommands {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a control be shown
    pub fn show(&mut self, widget_id: impl Into<String>) {
        self.push(widget_id, ControlAction::Show);
    }

    /// Request a control be hidden
    pub fn hide(&mut self, widget_id: impl Into<String>) {
        self.push(widget_id, ControlAction::Hide);
    }

    /// Request a control be enabled
    pub fn enable(&mut self, widget_id: impl Into<String>) {
        self.push(widget_id, ControlAction::Enable);
    }

    /// Request a control be disabled
    pub fn disable(&mut self, widget_id: impl Into<String>) {
        self.push(widget_id, ControlAction::Disable);
    }

    fn push(&mut self, widget_id: impl Into<String>, action: ControlAction) {
        self.commands.push(ControlCommand {
            widget_id: widget_id.into(),
            action,
        });
    }

    /// Whether any command was issued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take the issued commands, in order
    pub fn into_commands(self) -> Vec<ControlCommand> {
        self.commands
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_lifecycle_mode_rules() {
        assert!(LifecycleMode::Create.inserts_entity());
        assert!(LifecycleMode::Clone.inserts_entity());
        assert!(!LifecycleMode::Edit.inserts_entity());
        assert!(!LifecycleMode::Edit.identity_editable());
        assert_eq!(LifecycleMode::parse("Clone"), Some(LifecycleMode::Clone));
        assert_eq!(LifecycleMode::parse("add"), Some(LifecycleMode::Create));
        assert_eq!(LifecycleMode::parse("delete"), None);
        assert_eq!(LifecycleMode::Edit.to_string(), "edit");
    }

    #[test]
    fn test_session_selector() {
        let id = SessionId::new();
        assert_eq!(id.selector(), format!(".{}", id.class_name()));
        assert_eq!(id.class_name().len(), 32);
        assert_ne!(id, SessionId::new());
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&Value::Null)));
        assert!(is_blank(Some(&json!("  "))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!(false))));
        assert!(!is_blank(Some(&json!("x"))));
    }

    #[test]
    fn test_changed_attributes() {
        let changes = vec![
            FieldChanged::new("port", Some(json!(1)), Some(json!(2))),
            FieldChanged::new("host", Some(json!("h")), None),
        ];
        let changed = changed_attributes(&changes);
        assert_eq!(changed.get("port"), Some(&json!(2)));
        assert_eq!(changed.get("host"), Some(&Value::Null));
        assert!(changes[1].is_unset());
    }

    #[test]
    fn test_control_commands() {
        let mut commands = ControlCommands::new();
        assert!(commands.is_empty());
        commands.show("#account-token");
        commands.hide("#account-password");
        let commands = commands.into_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].action, ControlAction::Show);
        assert_eq!(commands[1].widget_id, "#account-password");
    }

    #[test]
    fn test_pagination_serde() {
        let p = Pagination::new(10, 5, 42);
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json, json!({"offset": 10, "perPage": 5, "total": 42}));
    }
}
