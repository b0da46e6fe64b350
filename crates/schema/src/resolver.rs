//! Component resolution
//!
//! Turns a [`ComponentConfig`] into everything a dialog needs at runtime:
//! compiled validators, the encrypted field set, typed hooks, and labels.
//! Any failure here is a schema error and the dialog never opens.

use crate::component::ComponentConfig;
use crate::field::FieldDescriptor;
use crate::hooks::HookRegistry;
use crate::validation::{
    ValidationError, ValidationErrorCode, ValidationResult, ValidatorSet, generate_validators,
};
use confdesk_core::{
    Attributes, DialogResult, OnChangeHook, OnLoadHook, SaveValidator, Validatable, WidgetIds,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// EncryptedFieldSet
// ============================================================================

/// Names of fields whose values are secrets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedFieldSet(BTreeSet<String>);

impl EncryptedFieldSet {
    /// Collect encrypted fields from descriptors
    pub fn from_fields(fields: &[FieldDescriptor]) -> Self {
        Self(
            fields
                .iter()
                .filter(|f| f.encrypted)
                .map(|f| f.field.clone())
                .collect(),
        )
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Remove every encrypted attribute; returns the fields removed
    pub fn strip(&self, attrs: &mut Attributes) -> Vec<String> {
        self.0
            .iter()
            .filter(|f| attrs.remove(f.as_str()).is_some())
            .cloned()
            .collect()
    }
}

// ============================================================================
// ResolvedHooks
// ============================================================================

/// Hooks a component declared, resolved to typed callables
#[derive(Clone, Default)]
pub struct ResolvedHooks {
    pub on_change: Option<Arc<dyn OnChangeHook>>,
    pub on_load: Option<Arc<dyn OnLoadHook>>,
    pub save_validator: Option<Arc<dyn SaveValidator>>,
}

impl fmt::Debug for ResolvedHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHooks")
            .field("on_change", &self.on_change.is_some())
            .field("on_load", &self.on_load.is_some())
            .field("save_validator", &self.save_validator.is_some())
            .finish()
    }
}

fn declared(source: &Option<String>) -> Option<&str> {
    source.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// ResolvedSchema
// ============================================================================

/// A component ready to drive a dialog
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    component: ComponentConfig,
    validators: ValidatorSet,
    encrypted: EncryptedFieldSet,
    hooks: ResolvedHooks,
    labels: BTreeMap<String, String>,
    widget_ids: WidgetIds,
}

impl ResolvedSchema {
    /// Resolve a component against a hook registry
    pub fn resolve(component: &ComponentConfig, registry: &HookRegistry) -> DialogResult<Self> {
        component.validate()?;

        let validators = generate_validators(&component.entity)?;
        let encrypted = EncryptedFieldSet::from_fields(&component.entity);

        let options = &component.options;
        let hooks = ResolvedHooks {
            on_change: declared(&options.on_change)
                .map(|s| registry.parse_on_change(s))
                .transpose()?,
            on_load: declared(&options.on_load)
                .map(|s| registry.parse_on_load(s))
                .transpose()?,
            save_validator: declared(&options.save_validator)
                .map(|s| registry.parse_save_validator(s))
                .transpose()?,
        };

        let labels = component
            .entity
            .iter()
            .map(|f| (f.field.clone(), f.display_label()))
            .collect();

        tracing::debug!(
            "Resolved component '{}': {} fields, {} validators, {} encrypted",
            component.name,
            component.entity.len(),
            validators.len(),
            encrypted.len()
        );

        Ok(Self {
            widget_ids: component.widget_ids(),
            component: component.clone(),
            validators,
            encrypted,
            hooks,
            labels,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn component(&self) -> &ComponentConfig {
        &self.component
    }

    pub fn name(&self) -> &str {
        &self.component.name
    }

    pub fn title(&self) -> &str {
        self.component.display_title()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.component.entity
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn encrypted(&self) -> &EncryptedFieldSet {
        &self.encrypted
    }

    pub fn hooks(&self) -> &ResolvedHooks {
        &self.hooks
    }

    /// Field label map
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Label of one field
    pub fn label(&self, field: &str) -> Option<&str> {
        self.labels.get(field).map(String::as_str)
    }

    /// Widget selector of every field's control
    pub fn widget_ids(&self) -> &WidgetIds {
        &self.widget_ids
    }

    // ========================================================================
    // Defaults
    // ========================================================================

    /// Defaults for every field absent from `attrs`
    pub fn missing_defaults(&self, attrs: &Attributes) -> Attributes {
        self.component
            .entity
            .iter()
            .filter(|f| !attrs.contains_key(&f.field))
            .filter_map(|f| Some((f.field.clone(), f.default_value.clone()?)))
            .collect()
    }

    /// Apply defaults to absent fields; returns the fields set
    pub fn apply_defaults(&self, attrs: &mut Attributes) -> Vec<String> {
        let defaults = self.missing_defaults(attrs);
        let applied = defaults.keys().cloned().collect();
        attrs.extend(defaults);
        applied
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Run field validators then the form-level save validator
    pub fn validate_form(&self, form: &Attributes) -> ValidationResult {
        let mut result = self.validators.validate(form, &self.labels);

        if let Some(validator) = &self.hooks.save_validator {
            if let Err(message) = validator.validate(form) {
                result.add_error(ValidationError::new(ValidationErrorCode::FormRejected, message));
            }
        }

        result
    }
}

// ============================================================================
// Tests
// ============================================================================
