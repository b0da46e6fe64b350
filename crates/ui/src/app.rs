//! Main Application Component for Confdesk
//!
//! Root Dioxus component: header, component sidebar, entity table, status
//! bar and the dialog overlay.

use dioxus::prelude::*;

use crate::components::{DeleteDialogPanel, EntityDialogPanel, EntityTable};
use crate::state::{ActiveDialog, StartupOptions, StatusLevel, WORKBENCH};

// ============================================================================
// Main App Component
// ============================================================================

/// Root application component
#[component]
pub fn App() -> Element {
    let options = use_context::<StartupOptions>();

    use_hook(move || {
        let loaded = WORKBENCH.write().load(&options);
        if let Err(e) = loaded {
            tracing::error!("Failed to load console: {}", e);
            WORKBENCH
                .write()
                .set_status(format!("Failed to load console: {}", e), StatusLevel::Error);
        }
    });

    rsx! {
        div {
            class: "app-container h-screen w-screen flex flex-col bg-slate-900 text-slate-100 overflow-hidden",

            Header {}

            div {
                class: "flex flex-1 overflow-hidden",
                Sidebar {}
                EntityTable {}
            }

            StatusBar {}

            DialogOverlay {}
        }
    }
}

// ============================================================================
// Header Component
// ============================================================================

#[component]
fn Header() -> Element {
    let workbench = WORKBENCH.read();
    let title = workbench
        .console
        .as_ref()
        .map(|c| c.config().display_name().to_string())
        .unwrap_or_else(|| crate::NAME.to_string());
    drop(workbench);

    rsx! {
        header {
            class: "toolbar h-12 bg-slate-800 border-b border-slate-700 flex items-center px-4 shrink-0",
            span { class: "font-semibold text-sm", "{title}" }
        }
    }
}

// ============================================================================
// Sidebar Component
// ============================================================================

/// Component navigation: configuration tabs, then inputs
#[component]
fn Sidebar() -> Element {
    let workbench = WORKBENCH.read();
    let active = workbench.active_component.clone();
    let items: Vec<(String, String, bool)> = workbench
        .console
        .as_ref()
        .map(|c| {
            c.tables()
                .iter()
                .map(|t| (t.name().to_string(), t.title().to_string(), t.kind.is_input()))
                .collect()
        })
        .unwrap_or_default();
    drop(workbench);

    rsx! {
        nav {
            class: "sidebar w-56 bg-slate-800 border-r border-slate-700 py-4 shrink-0",
            for (name, title, is_input) in items.into_iter() {
                button {
                    key: "{name}",
                    class: "w-full text-left px-4 py-2 text-sm hover:bg-slate-700",
                    class: if active.as_deref() == Some(name.as_str()) { "bg-slate-700 text-indigo-300" } else { "" },
                    onclick: {
                        let name = name.clone();
                        move |_| WORKBENCH.write().select_component(name.clone())
                    },
                    "{title}"
                    if is_input {
                        span { class: "ml-2 text-xs text-slate-500", "input" }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Status Bar Component
// ============================================================================

#[component]
fn StatusBar() -> Element {
    let status = WORKBENCH.read().status.clone();

    rsx! {
        footer {
            class: "status-bar h-6 bg-slate-800 border-t border-slate-700 flex items-center px-4 text-xs text-slate-400 shrink-0",
            if let Some(msg) = status {
                span { class: msg.level.text_class(), "{msg.text}" }
            } else {
                span { "Ready" }
            }
        }
    }
}

// ============================================================================
// Dialog Overlay Component
// ============================================================================

/// Modal dialog overlay
#[component]
fn DialogOverlay() -> Element {
    let kind = match &WORKBENCH.read().dialog {
        Some(ActiveDialog::Entity(_)) => Some(true),
        Some(ActiveDialog::Delete(_)) => Some(false),
        None => None,
    };
    let Some(is_entity) = kind else {
        return rsx! {};
    };

    rsx! {
        div {
            class: "fixed inset-0 z-50 flex items-center justify-center",

            div { class: "absolute inset-0 bg-black/50" }

            div {
                class: "relative bg-slate-800 rounded-lg shadow-xl border border-slate-700 mx-4 max-w-2xl w-full",
                if is_entity {
                    EntityDialogPanel {}
                } else {
                    DeleteDialogPanel {}
                }
            }
        }
    }
}
