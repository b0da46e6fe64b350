//! # Confdesk Core
//!
//! Core types, traits, and error handling for Confdesk.
//!
//! This crate provides the foundational building blocks used throughout
//! the workspace, including:
//!
//! - **Types**: attribute values, lifecycle modes, session ids, pagination,
//!   draft change events and control commands
//! - **Traits**: `Validatable` and the hook capabilities `OnChangeHook`,
//!   `OnLoadHook`, `SaveValidator`
//! - **Errors**: unified error handling with `DialogError` and `DialogResult`
//! - **Messages**: the user-facing message catalog
//!

pub mod error;
pub mod messages;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{DialogError, DialogResult};
pub use messages::formatted_message;
pub use traits::{OnChangeHook, OnLoadHook, SaveValidator, Validatable};
pub use types::{
    Attributes, ControlAction, ControlCommand, ControlCommands, FieldChanged, LifecycleMode,
    NAME_ATTRIBUTE, Pagination, REF_COUNT_ATTRIBUTE, SessionId, Value, WidgetIds,
    changed_attributes, display_value, is_blank,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
