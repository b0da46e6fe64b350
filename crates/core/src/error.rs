//! Error types for Confdesk
//!
//! This module provides unified error handling across the workspace:
//! schema errors raised while resolving a component, validation errors
//! raised by an entity before it is persisted, persistence failures, and
//! the usual IO / serialization plumbing.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Confdesk
#[derive(Debug, Error)]
pub enum DialogError {
    // ========================================================================
    // Schema Errors (fatal to dialog construction)
    // ========================================================================
    /// The component definition itself is malformed
    #[error("Invalid schema for '{component}': {message}")]
    InvalidSchema { component: String, message: String },

    /// A hook source string could not be parsed
    #[error("Failed to parse {hook} hook '{source_text}': {message}")]
    HookParse {
        hook: String,
        source_text: String,
        message: String,
    },

    /// A hook source string names a callable nobody registered
    #[error("Unknown {hook} hook: '{name}'")]
    UnknownHook { hook: String, name: String },

    /// A regex validator pattern failed to compile
    #[error("Invalid pattern for field '{field}': {message}")]
    InvalidPattern { field: String, message: String },

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// A draft or configuration was rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// A field value was rejected
    #[error("Field validation failed for '{field}': {message}")]
    FieldValidation { field: String, message: String },

    // ========================================================================
    // Not Found Errors
    // ========================================================================
    /// Component not found in the console configuration
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// Entity not found in a collection or store
    #[error("Entity '{name}' not found in '{component}'")]
    EntityNotFound { component: String, name: String },

    /// Configuration file not found
    #[error("Configuration not found at path: {0}")]
    ConfigNotFound(PathBuf),

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// The store rejected an operation
    #[error("Persistence failed ({status}): {message}")]
    Persistence { status: u16, message: String },

    /// An entity with the same name already exists
    #[error("Entity '{name}' already exists in '{component}'")]
    DuplicateEntity { component: String, name: String },

    // ========================================================================
    // State Errors
    // ========================================================================
    /// An operation was attempted in a state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// serde_json failure
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// Invalid configuration file format
    #[error("Invalid configuration format: {0}")]
    InvalidConfigFormat(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Broken invariant
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any error with a context prefix
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl DialogError {
    /// Create an invalid schema error
    pub fn invalid_schema(component: impl Into<String>, msg: impl Into<String>) -> Self {
        DialogError::InvalidSchema {
            component: component.into(),
            message: msg.into(),
        }
    }

    /// Create a hook parse error
    pub fn hook_parse(
        hook: impl Into<String>,
        source_text: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        DialogError::HookParse {
            hook: hook.into(),
            source_text: source_text.into(),
            message: msg.into(),
        }
    }

    /// Form-level validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DialogError::Validation(msg.into())
    }

    /// Validation error tied to one field
    pub fn field_validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        DialogError::FieldValidation {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        DialogError::InvalidState(msg.into())
    }

    /// Invariant violation
    pub fn internal(msg: impl Into<String>) -> Self {
        DialogError::Internal(msg.into())
    }

    /// Error carrying a context prefix
    pub fn with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        DialogError::WithContext {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Check if this error prevents a dialog from opening
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            DialogError::InvalidSchema { .. }
                | DialogError::HookParse { .. }
                | DialogError::UnknownHook { .. }
                | DialogError::InvalidPattern { .. }
        )
    }

    /// Whether a draft or configuration failed validation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DialogError::Validation(_) | DialogError::FieldValidation { .. }
        )
    }

    /// Whether a component or entity lookup failed
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DialogError::ComponentNotFound(_)
                | DialogError::EntityNotFound { .. }
                | DialogError::ConfigNotFound(_)
        )
    }

    /// Whether the error came from the filesystem
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            DialogError::Io(_) | DialogError::FileRead { .. } | DialogError::FileWrite { .. }
        )
    }
}

/// Result type alias using DialogError
pub type DialogResult<T> = Result<T, DialogError>;

// ============================================================================
// Tests
// ============================================================================
