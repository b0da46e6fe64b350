//! # Confdesk Schema
//!
//! Declarative component schemas and everything derived from them.
//!
//! ## Core Concepts
//!
//! - **FieldDescriptor**: one editable attribute of an entity (label,
//!   control, default, secrecy, constraints)
//! - **ComponentConfig**: one entity kind with its fields and hook sources
//! - **HookRegistry**: named hook factories; hook sources resolve against it
//! - **ResolvedSchema**: a component with validators compiled, hooks typed,
//!   and the encrypted field set collected
//! - **AppConfig**: the console configuration listing every component
//!

pub mod component;
pub mod field;
pub mod hooks;
pub mod resolver;
pub mod serialization;
pub mod validation;

pub use component::{ComponentConfig, HookSources};
pub use field::{ControlType, FieldDescriptor, HelpLink};
pub use hooks::{HookCall, HookRegistry, RequireOneOf, RequireTogether, ShowWhen};
pub use resolver::{EncryptedFieldSet, ResolvedHooks, ResolvedSchema};
pub use serialization::{
    AppConfig, ComponentKind, ConfigFile, ConfigurationPage, ConsoleMeta, InputsPage, Pages,
    load_config, load_config_from_str, load_config_from_toml, save_config,
};
pub use validation::{
    FieldValidator, Validation, ValidationError, ValidationErrorCode, ValidationResult,
    ValidatorSet, generate_validators,
};

pub use confdesk_core::{DialogError, DialogResult};

/// Current schema version for configuration files
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
