//! Field descriptors
//!
//! A field descriptor declares one editable attribute of a configuration
//! entity: its label, control type, default, whether it is a secret, and
//! the constraints its value must satisfy.

use crate::validation::Validation;
use confdesk_core::{Attributes, Value};
use heck::ToTitleCase;
use serde::{Deserialize, Serialize};

// ============================================================================
// FieldDescriptor
// ============================================================================

/// Declarative description of one entity field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Attribute name the control is bound to
    pub field: String,

    /// Human-readable label
    #[serde(default)]
    pub label: String,

    /// Control type used to edit the value
    #[serde(rename = "type", default)]
    pub control: ControlType,

    /// Value applied when the attribute is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Whether the value is a secret that must never be redisplayed
    #[serde(default)]
    pub encrypted: bool,

    /// Whether a value must be provided
    #[serde(default)]
    pub required: bool,

    /// Link rendered next to the control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_link: Option<HelpLink>,

    /// Help text rendered below the control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,

    /// Explicit display override; controls carrying one start hidden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Value>,

    /// Constraints applied to a non-blank value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validation>,

    /// Control-specific options passed through to the widget layer
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub options: Attributes,
}

impl FieldDescriptor {
    /// Create a text field descriptor
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            control: ControlType::Text,
            default_value: None,
            encrypted: false,
            required: false,
            help_link: None,
            display_text: None,
            display: None,
            validators: Vec::new(),
            options: Attributes::new(),
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the control type
    pub fn with_control(mut self, control: ControlType) -> Self {
        self.control = control;
        self
    }

    /// Set a default value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Mark the field as a secret
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Add a validation rule
    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validators.push(validation);
        self
    }

    /// Set the help link
    pub fn with_help_link(mut self, text: impl Into<String>, link: impl Into<String>) -> Self {
        self.help_link = Some(HelpLink {
            text: text.into(),
            link: link.into(),
        });
        self
    }

    /// Set the help text
    pub fn with_display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }

    /// Start the control hidden; a hook is expected to show it
    pub fn hidden_until_shown(mut self) -> Self {
        self.display = Some(Value::Bool(false));
        self
    }

    /// Add a control option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    // ========================================================================
    // Utility methods
    // ========================================================================

    /// Get the display label (falls back to the title-cased field name)
    pub fn display_label(&self) -> String {
        if self.label.trim().is_empty() {
            self.field.to_title_case()
        } else {
            self.label.clone()
        }
    }

    /// Whether the control masks its input
    pub fn is_password(&self) -> bool {
        self.encrypted || self.control == ControlType::Password
    }

    /// Whether the control starts hidden
    pub fn starts_hidden(&self) -> bool {
        self.display.is_some()
    }
}

// ============================================================================
// HelpLink
// ============================================================================

/// Link rendered next to a control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpLink {
    pub text: String,
    pub link: String,
}

// ============================================================================
// ControlType
// ============================================================================

/// Control used to edit a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlType {
    /// Single-line text input
    #[default]
    Text,
    /// Masked text input
    Password,
    /// Multi-line text input
    Textarea,
    /// Dropdown select
    SingleSelect,
    /// Multi-value select
    MultipleSelect,
    /// Checkbox
    Checkbox,
    /// Radio buttons
    Radio,
    /// Anything the widget layer renders on its own
    #[serde(other)]
    Custom,
}

impl ControlType {
    /// Get the HTML input type attribute
    pub fn html_input_type(&self) -> &'static str {
        match self {
            ControlType::Password => "password",
            ControlType::Checkbox => "checkbox",
            ControlType::Radio => "radio",
            ControlType::Textarea => "textarea",
            _ => "text",
        }
    }

    /// Whether the control offers a fixed list of choices
    pub fn has_choices(&self) -> bool {
        matches!(
            self,
            ControlType::SingleSelect | ControlType::MultipleSelect | ControlType::Radio
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
