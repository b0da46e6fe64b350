//! # UI Components
//!
//! Dioxus components of the desktop shell.
//!
//! ```text
//! EntityTable
//! └── RowAction (edit / clone / delete)
//!
//! EntityDialogPanel
//! └── FieldControl (one per field)
//!     └── FieldFrame + TextInput / TextArea / Select / Checkbox
//!
//! DeleteDialogPanel
//! ```

pub mod delete_dialog;
pub mod entity_dialog;
pub mod entity_table;
pub mod field_control;
pub mod inputs;

pub use delete_dialog::DeleteDialogPanel;
pub use entity_dialog::EntityDialogPanel;
pub use entity_table::EntityTable;
pub use field_control::FieldControl;
pub use inputs::{Checkbox, FieldFrame, Select, SelectOption, TextArea, TextInput};
