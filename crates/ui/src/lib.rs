//! # Confdesk UI
//!
//! Entity dialogs for administration consoles, and the Dioxus desktop shell
//! that hosts them.
//!
//! ## Layers
//!
//! - Draft model, entity handles and collections
//! - Save transactions, the prompt board and the persistence transport
//! - Render plans and the dialog controllers (entity and delete)
//! - Dioxus components and the desktop launcher
//!

// ============================================================================
// Modules
// ============================================================================

pub mod app;
pub mod collection;
pub mod components;
pub mod console;
pub mod controller;
pub mod delete;
pub mod draft;
pub mod entity;
pub mod prompt;
pub mod render;
pub mod state;
pub mod store;
pub mod transaction;
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

pub use confdesk_core;
pub use confdesk_schema;

pub use app::App;
pub use collection::{Collection, PageState, SharedCollection};
pub use console::{ComponentTable, Console};
pub use controller::{
    DialogContext, DialogPhase, DialogRequest, EntityDialog, SaveOutcome, SaveStart,
};
pub use delete::{DeleteDialog, DeleteOutcome, DeleteStart, DeleteView};
pub use draft::{DraftListener, DraftModel};
pub use entity::{EntityHandle, PersistedEntity, SavedEntity};
pub use prompt::{PromptBoard, PromptState};
pub use render::{ControlSpec, ControlState, ControlStates, DialogTemplate, DialogView};
pub use state::{
    ActiveDialog, StartupOptions, StatusLevel, StatusMessage, WORKBENCH, Workbench,
};
pub use store::EntityStore;
pub use transaction::{SaveTransaction, TransactionState};
pub use transport::{
    Completer, DeleteRequest, EntityTransport, Outcome, Pending, PersistenceFailure, SaveKind,
    SaveRequest, parse_error_message,
};

// ============================================================================
// Constants
// ============================================================================

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = "Confdesk";

/// Base styles injected into the desktop window
const STYLES: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; background: #0f172a; color: #f1f5f9; }
button:disabled { opacity: 0.5; cursor: not-allowed; }
"#;

// ============================================================================
// Launch Function
// ============================================================================

/// Launch the desktop shell
///
/// ```rust,ignore
/// fn main() {
///     let config = confdesk_schema::load_config("globalConfig.json").unwrap();
///     confdesk_ui::launch(StartupOptions { config, store_path: None });
/// }
/// ```
pub fn launch(options: StartupOptions) {
    tracing::info!("Starting {} v{}", NAME, VERSION);

    let title = format!("{} - {}", options.config.display_name(), NAME);
    let custom_head = format!(r#"<style type="text/css">{}</style>"#, STYLES);

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(
                    dioxus::desktop::WindowBuilder::new()
                        .with_title(title)
                        .with_resizable(true)
                        .with_inner_size(dioxus::desktop::LogicalSize::new(1200.0, 800.0))
                        .with_min_inner_size(dioxus::desktop::LogicalSize::new(800.0, 600.0)),
                )
                .with_menu(None)
                .with_custom_head(custom_head),
        )
        .with_context(options)
        .launch(App);
}

// ============================================================================
// Tests
// ============================================================================
