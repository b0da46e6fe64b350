//! Component definitions
//!
//! A component is one kind of configuration entity (an account, a proxy
//! setting, an input) together with the fields its dialog edits and the
//! hook strings it declares.

use crate::field::FieldDescriptor;
use confdesk_core::{DialogError, DialogResult, Validatable, WidgetIds};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// HookSources
// ============================================================================

/// Hook source strings declared by a component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_load: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_change: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_validator: Option<String>,
}

impl HookSources {
    /// Whether no hook is declared
    pub fn is_empty(&self) -> bool {
        [&self.on_load, &self.on_change, &self.save_validator]
            .iter()
            .all(|s| s.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

// ============================================================================
// ComponentConfig
// ============================================================================

/// Declarative definition of one entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    /// Component name; used in REST paths and widget ids
    pub name: String,

    /// Title shown in dialog headers
    #[serde(default)]
    pub title: String,

    /// Editable fields, in display order
    #[serde(default)]
    pub entity: Vec<FieldDescriptor>,

    /// Hook sources
    #[serde(default, skip_serializing_if = "HookSources::is_empty")]
    pub options: HookSources,
}

impl ComponentConfig {
    /// Create an empty component
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            entity: Vec::new(),
            options: HookSources::default(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.entity.push(field);
        self
    }

    /// Set the on-change hook source
    pub fn with_on_change(mut self, source: impl Into<String>) -> Self {
        self.options.on_change = Some(source.into());
        self
    }

    /// Set the on-load hook source
    pub fn with_on_load(mut self, source: impl Into<String>) -> Self {
        self.options.on_load = Some(source.into());
        self
    }

    /// Set the save validator source
    pub fn with_save_validator(mut self, source: impl Into<String>) -> Self {
        self.options.save_validator = Some(source.into());
        self
    }

    /// Get a field descriptor by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.entity.iter().find(|f| f.field == name)
    }

    /// Title, falling back to the component name
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    /// Element id of a field's control
    pub fn element_id(&self, field: &str) -> String {
        format!("{}-{}", self.name, field)
    }

    /// Widget selector of every field's control
    pub fn widget_ids(&self) -> WidgetIds {
        self.entity
            .iter()
            .map(|f| (f.field.clone(), format!("#{}", self.element_id(&f.field))))
            .collect()
    }

    /// Names of fields holding secrets
    pub fn encrypted_fields(&self) -> Vec<&str> {
        self.entity
            .iter()
            .filter(|f| f.encrypted)
            .map(|f| f.field.as_str())
            .collect()
    }
}

impl Validatable for ComponentConfig {
    fn validate(&self) -> DialogResult<()> {
        if self.name.trim().is_empty() {
            return Err(DialogError::invalid_schema(
                "<unnamed>",
                "Component name cannot be empty",
            ));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DialogError::invalid_schema(
                &self.name,
                "Component name may only contain letters, digits, '_' and '-'",
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.entity {
            if field.field.trim().is_empty() {
                return Err(DialogError::invalid_schema(
                    &self.name,
                    "Field name cannot be empty",
                ));
            }
            if !seen.insert(field.field.as_str()) {
                return Err(DialogError::invalid_schema(
                    &self.name,
                    format!("Duplicate field '{}'", field.field),
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account() -> ComponentConfig {
        ComponentConfig::new("account", "Account")
            .with_field(FieldDescriptor::new("name", "Name").required())
            .with_field(FieldDescriptor::new("password", "Password").encrypted())
    }

    #[test]
    fn test_widget_ids() {
        let ids = account().widget_ids();
        assert_eq!(ids.get("name").map(String::as_str), Some("#account-name"));
        assert_eq!(
            ids.get("password").map(String::as_str),
            Some("#account-password")
        );
        assert_eq!(account().element_id("name"), "account-name");
    }

    #[test]
    fn test_encrypted_fields() {
        assert_eq!(account().encrypted_fields(), vec!["password"]);
    }

    #[test]
    fn test_validate_component() {
        assert!(account().is_valid());

        let empty = ComponentConfig::new("", "Nothing");
        assert!(empty.validate().unwrap_err().is_schema());

        let dup = account().with_field(FieldDescriptor::new("name", "Again"));
        let err = dup.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate field 'name'"));

        let blank = ComponentConfig::new("proxy", "Proxy").with_field(FieldDescriptor::new("", ""));
        assert!(!blank.is_valid());
    }

    #[test]
    fn test_deserialize_component() {
        let component: ComponentConfig = serde_json::from_value(json!({
            "name": "account",
            "title": "Account",
            "entity": [{"field": "name", "label": "Name", "required": true}],
            "options": {"onChange": "show_when(auth, basic, password)"}
        }))
        .unwrap();

        assert_eq!(component.entity.len(), 1);
        assert_eq!(
            component.options.on_change.as_deref(),
            Some("show_when(auth, basic, password)")
        );
        assert!(component.options.on_load.is_none());
    }

    #[test]
    fn test_display_title_fallback() {
        assert_eq!(ComponentConfig::new("proxy", "").display_title(), "proxy");
        assert_eq!(account().display_title(), "Account");
    }
}
