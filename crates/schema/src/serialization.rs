//! Console configuration loading and saving
//!
//! A console configuration lists every component the console manages:
//! configuration tabs (accounts, proxy, logging) and input services. Files
//! are JSON or TOML, optionally wrapped with a schema version.

use crate::component::ComponentConfig;
use crate::hooks::HookRegistry;
use crate::resolver::ResolvedSchema;
use crate::CONFIG_SCHEMA_VERSION;
use confdesk_core::{DialogError, DialogResult, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// AppConfig
// ============================================================================

/// Root of a console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub meta: ConsoleMeta,
    pub pages: Pages,
}

/// Console identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Pages of the console
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ConfigurationPage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputsPage>,
}

/// Configuration page: one tab per component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationPage {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tabs: Vec<ComponentConfig>,
}

/// Inputs page: one service per component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputsPage {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub services: Vec<ComponentConfig>,
}

/// Where a component lives in the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Tab,
    Input,
}

impl ComponentKind {
    pub fn is_input(&self) -> bool {
        matches!(self, ComponentKind::Input)
    }
}

impl AppConfig {
    /// Create an empty configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ConsoleMeta {
                name: name.into(),
                display_name: None,
                version: None,
            },
            pages: Pages::default(),
        }
    }

    /// Add a configuration tab
    pub fn with_tab(mut self, component: ComponentConfig) -> Self {
        self.pages
            .configuration
            .get_or_insert_with(ConfigurationPage::default)
            .tabs
            .push(component);
        self
    }

    /// Add an input service
    pub fn with_input(mut self, component: ComponentConfig) -> Self {
        self.pages
            .inputs
            .get_or_insert_with(InputsPage::default)
            .services
            .push(component);
        self
    }

    /// Display name, falling back to the console name
    pub fn display_name(&self) -> &str {
        self.meta.display_name.as_deref().unwrap_or(&self.meta.name)
    }

    /// Every component with its kind, tabs first
    pub fn components(&self) -> impl Iterator<Item = (&ComponentConfig, ComponentKind)> {
        let tabs = self
            .pages
            .configuration
            .iter()
            .flat_map(|p| p.tabs.iter())
            .map(|c| (c, ComponentKind::Tab));
        let inputs = self
            .pages
            .inputs
            .iter()
            .flat_map(|p| p.services.iter())
            .map(|c| (c, ComponentKind::Input));
        tabs.chain(inputs)
    }

    /// Find a component by name
    pub fn find_component(&self, name: &str) -> DialogResult<(&ComponentConfig, ComponentKind)> {
        self.components()
            .find(|(c, _)| c.name == name)
            .ok_or_else(|| DialogError::ComponentNotFound(name.to_string()))
    }

    /// Resolve every component; the first schema error wins
    pub fn resolve_all(&self, registry: &HookRegistry) -> DialogResult<Vec<ResolvedSchema>> {
        self.components()
            .map(|(c, _)| ResolvedSchema::resolve(c, registry))
            .collect()
    }
}

impl Validatable for AppConfig {
    fn validate(&self) -> DialogResult<()> {
        if self.meta.name.trim().is_empty() {
            return Err(DialogError::InvalidConfig(
                "Console name cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (component, _) in self.components() {
            component.validate()?;
            if !seen.insert(component.name.as_str()) {
                return Err(DialogError::InvalidConfig(format!(
                    "Duplicate component '{}'",
                    component.name
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Config File Wrapper
// ============================================================================

/// Wrapper for configuration files that includes version information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Schema version for migration purposes
    pub schema_version: u32,

    /// The configuration
    pub config: AppConfig,
}

impl ConfigFile {
    pub fn new(config: AppConfig) -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            config,
        }
    }
}

// ============================================================================
// Load Functions
// ============================================================================

/// Load a console configuration from a `.json` or `.toml` file
pub fn load_config(path: impl AsRef<Path>) -> DialogResult<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DialogError::ConfigNotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|e| DialogError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config = if is_toml {
        load_config_from_toml(&text)
    } else {
        load_config_from_str(&text)
    }
    .map_err(|e| match e {
        DialogError::JsonSerialization(je) => DialogError::FileRead {
            path: path.to_path_buf(),
            message: format!("Invalid configuration file format: {}", je),
        },
        other => other,
    })?;

    tracing::info!(
        "Loaded console '{}' with {} components from {}",
        config.meta.name,
        config.components().count(),
        path.display()
    );
    Ok(config)
}

/// Load a console configuration from a JSON string
pub fn load_config_from_str(json: &str) -> DialogResult<AppConfig> {
    // Try the versioned wrapper first
    if let Ok(file) = serde_json::from_str::<ConfigFile>(json) {
        file.config.validate()?;
        return Ok(file.config);
    }

    let config: AppConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load a console configuration from a TOML string
pub fn load_config_from_toml(text: &str) -> DialogResult<AppConfig> {
    if let Ok(file) = toml::from_str::<ConfigFile>(text) {
        file.config.validate()?;
        return Ok(file.config);
    }

    let config: AppConfig =
        toml::from_str(text).map_err(|e| DialogError::InvalidConfigFormat(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

// ============================================================================
// Save Functions
// ============================================================================

/// Save a console configuration as versioned JSON
pub fn save_config(config: &AppConfig, path: impl AsRef<Path>) -> DialogResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&ConfigFile::new(config.clone())).map_err(|e| {
        DialogError::FileWrite {
            path: path.to_path_buf(),
            message: format!("Failed to serialize configuration: {}", e),
        }
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, json).map_err(|e| DialogError::FileWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
