//! # Entity Dialog Component
//!
//! Draws the open add / edit / clone dialog from its render plan and
//! routes edits, submit and cancel back to the controller.

use confdesk_core::{LifecycleMode, Value};
use dioxus::prelude::*;

use crate::components::field_control::FieldControl;
use crate::controller::SaveStart;
use crate::render::DialogView;
use crate::state::{ActiveDialog, WORKBENCH};

/// Apply an edit to the open dialog
fn edit_field(field: String, value: Value) {
    let mut workbench = WORKBENCH.write();
    let Some(ActiveDialog::Entity(dialog)) = &mut workbench.dialog else {
        return;
    };
    match dialog.set_field(&field, value) {
        Ok(_) => {
            dialog.render();
        }
        Err(e) => tracing::warn!("Rejected edit of '{}': {}", field, e),
    }
}

/// Submit the open dialog
fn submit() {
    let Some((session, start)) = WORKBENCH.write().begin_save() else {
        return;
    };
    match start {
        SaveStart::Done(outcome) => WORKBENCH.write().report_save(outcome),
        SaveStart::Pending(pending) => {
            spawn(async move {
                let outcome = pending.wait().await;
                WORKBENCH.write().finish_save(session, outcome);
            });
        }
    }
}

/// Submit button text for a mode
fn submit_label(mode: LifecycleMode) -> &'static str {
    match mode {
        LifecycleMode::Edit => "Update",
        LifecycleMode::Create | LifecycleMode::Clone => "Add",
    }
}

/// The open entity dialog
#[component]
pub fn EntityDialogPanel() -> Element {
    let view: Option<DialogView> = match &WORKBENCH.read().dialog {
        Some(ActiveDialog::Entity(dialog)) => Some(dialog.view()),
        _ => None,
    };
    let Some(view) = view else {
        return rsx! {};
    };

    let saving = view.saving.is_some();
    let button_text = view
        .saving
        .clone()
        .unwrap_or_else(|| submit_label(view.template.mode).to_string());

    rsx! {
        div {
            class: "entity-dialog {view.session_class} p-6 max-h-[80vh] overflow-y-auto",
            onclick: move |_| {
                if let Some(ActiveDialog::Entity(dialog)) = &WORKBENCH.write().dialog {
                    dialog.dismiss_prompts();
                }
            },

            // Header
            div {
                class: "mb-6",
                h2 { class: "text-xl font-bold", "{view.template.title}" }
                if let Some(source) = &view.template.name {
                    p { class: "text-sm text-slate-400", "Cloned from {source}" }
                }
            }

            // Error banner
            if let Some(error) = &view.error {
                div {
                    class: "mb-4 p-3 bg-red-500/20 border border-red-500/50 rounded-lg text-red-300 text-sm",
                    "{error}"
                }
            }

            if !view.form_errors.is_empty() {
                div {
                    class: "mb-4 p-3 bg-red-500/20 border border-red-500/50 rounded-lg",
                    ul {
                        class: "text-red-300 text-sm list-disc list-inside",
                        for error in view.form_errors.iter() {
                            li { "{error}" }
                        }
                    }
                }
            }

            // Fields
            for spec in view.controls.iter().cloned() {
                FieldControl {
                    key: "{spec.element_id}",
                    spec,
                    locked: saving,
                    on_change: move |(field, value): (String, Value)| edit_field(field, value),
                }
            }

            // Actions
            div {
                class: "flex justify-end gap-3 mt-6",

                button {
                    class: "px-4 py-2 rounded-lg bg-slate-700 hover:bg-slate-600 text-sm",
                    onclick: move |e| {
                        e.stop_propagation();
                        WORKBENCH.write().close_dialog();
                    },
                    "Cancel"
                }

                button {
                    class: "px-4 py-2 rounded-lg bg-indigo-600 hover:bg-indigo-500 text-sm font-medium",
                    class: if !view.submit_enabled { "opacity-50 cursor-not-allowed" } else { "" },
                    disabled: !view.submit_enabled,
                    onclick: move |e| {
                        e.stop_propagation();
                        submit();
                    },
                    "{button_text}"
                }
            }
        }
    }
}
