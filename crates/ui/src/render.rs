//! Render plans
//!
//! A [`DialogView`] is everything the widget layer needs to draw a dialog:
//! the template variant, one [`ControlSpec`] per field, and the session's
//! prompts. It holds plain data and can be serialized for headless use.

use confdesk_core::{
    Attributes, ControlAction, ControlCommand, LifecycleMode, NAME_ATTRIBUTE, Value,
};
use confdesk_schema::{ControlType, HelpLink, ResolvedSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Control visibility
// ============================================================================

/// Visibility and enablement of one control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub visible: bool,
    pub enabled: bool,
}

/// Visibility and enablement of every control of a dialog, by widget id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlStates {
    states: BTreeMap<String, ControlState>,
}

impl ControlStates {
    /// Initial states: controls with a display override start hidden
    pub fn from_schema(schema: &ResolvedSchema) -> Self {
        let states = schema
            .fields()
            .iter()
            .filter_map(|f| {
                let widget = schema.widget_ids().get(&f.field)?;
                Some((
                    widget.clone(),
                    ControlState {
                        visible: !f.starts_hidden(),
                        enabled: true,
                    },
                ))
            })
            .collect();
        Self { states }
    }

    /// Apply hook commands; commands for unknown widgets are dropped
    pub fn apply(&mut self, commands: Vec<ControlCommand>) {
        for command in commands {
            let Some(state) = self.states.get_mut(&command.widget_id) else {
                tracing::debug!("Ignoring command for unknown widget {}", command.widget_id);
                continue;
            };
            match command.action {
                ControlAction::Show => state.visible = true,
                ControlAction::Hide => state.visible = false,
                ControlAction::Enable => state.enabled = true,
                ControlAction::Disable => state.enabled = false,
            }
        }
    }

    pub fn get(&self, widget_id: &str) -> Option<ControlState> {
        self.states.get(widget_id).copied()
    }
}

// ============================================================================
// Template
// ============================================================================

/// Header variant of a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogTemplate {
    pub mode: LifecycleMode,
    pub title: String,
    /// Source entity name (clone only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the component is an input service (create and edit only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_input: Option<bool>,
}

// ============================================================================
// ControlSpec
// ============================================================================

/// How to draw one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSpec {
    /// Field the control is bound to
    pub field: String,
    pub label: String,
    pub control: ControlType,
    /// `{component}-{field}`
    pub element_id: String,
    /// `#{component}-{field}`
    pub widget_id: String,
    /// Current draft value (null when unset)
    pub value: Value,
    /// Whether the input is masked
    pub password: bool,
    /// Id of the hidden password input rendered ahead of a masked control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_password_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_link: Option<HelpLink>,
    pub required: bool,
    pub readonly: bool,
    pub visible: bool,
    pub enabled: bool,
    /// Descriptor options merged into the control configuration
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub options: Attributes,
    /// Inline validation message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// DialogView
// ============================================================================

/// Everything needed to draw a dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogView {
    /// Class attached to the dialog root; scopes every prompt
    pub session_class: String,
    pub template: DialogTemplate,
    pub controls: Vec<ControlSpec>,
    pub submit_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saving: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_errors: Vec<String>,
}

impl DialogView {
    /// Get a control by field
    pub fn control(&self, field: &str) -> Option<&ControlSpec> {
        self.controls.iter().find(|c| c.field == field)
    }

    /// Controls currently shown
    pub fn visible_controls(&self) -> impl Iterator<Item = &ControlSpec> {
        self.controls.iter().filter(|c| c.visible)
    }
}

/// Build the control specs of a dialog
pub(crate) fn build_controls(
    schema: &ResolvedSchema,
    mode: LifecycleMode,
    draft: &Attributes,
    states: &ControlStates,
    field_errors: &BTreeMap<String, String>,
) -> Vec<ControlSpec> {
    schema
        .fields()
        .iter()
        .map(|f| {
            let element_id = schema.component().element_id(&f.field);
            let widget_id = format!("#{}", element_id);
            let state = states.get(&widget_id).unwrap_or(ControlState {
                visible: true,
                enabled: true,
            });
            let password = f.is_password();

            ControlSpec {
                field: f.field.clone(),
                label: f.display_label(),
                control: if password {
                    ControlType::Password
                } else {
                    f.control
                },
                value: draft.get(&f.field).cloned().unwrap_or(Value::Null),
                password,
                shadow_password_id: password.then(|| f.field.clone()),
                display_text: f.display_text.clone(),
                help_link: f.help_link.clone(),
                required: f.required,
                readonly: !mode.identity_editable() && f.field == NAME_ATTRIBUTE,
                visible: state.visible,
                enabled: state.enabled,
                options: f.options.clone(),
                error: field_errors.get(&f.field).cloned(),
                element_id,
                widget_id,
            }
        })
        .collect()
}
