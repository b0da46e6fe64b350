//! # Delete Dialog Component
//!
//! Confirmation shown before an entity is removed.

use dioxus::prelude::*;

use crate::delete::{DeleteStart, DeleteView};
use crate::state::{ActiveDialog, StatusLevel, WORKBENCH};

fn confirm() {
    let Some(start) = WORKBENCH.write().begin_delete() else {
        return;
    };
    match start {
        DeleteStart::Done(outcome) => {
            tracing::debug!("Delete finished without the store: {:?}", outcome);
            WORKBENCH
                .write()
                .set_status("The entity could not be deleted", StatusLevel::Warning);
        }
        DeleteStart::Pending(pending) => {
            spawn(async move {
                let outcome = pending.wait().await;
                WORKBENCH.write().finish_delete(outcome);
            });
        }
    }
}

/// The open delete confirmation
#[component]
pub fn DeleteDialogPanel() -> Element {
    let view: Option<DeleteView> = match &WORKBENCH.read().dialog {
        Some(ActiveDialog::Delete(dialog)) => Some(dialog.view()),
        _ => None,
    };
    let Some(view) = view else {
        return rsx! {};
    };
    let deleting = view.deleting.is_some();

    rsx! {
        div {
            class: "delete-dialog {view.session_class} p-6",
            onclick: move |_| {
                if let Some(ActiveDialog::Delete(dialog)) = &WORKBENCH.write().dialog {
                    dialog.dismiss_prompts();
                }
            },

            h2 { class: "text-xl font-bold mb-4", "{view.title}" }

            if let Some(error) = &view.error {
                div {
                    class: "mb-4 p-3 bg-red-500/20 border border-red-500/50 rounded-lg text-red-300 text-sm",
                    "{error}"
                }
            }

            p { class: "text-sm text-slate-300 mb-6", "{view.message}" }

            div {
                class: "flex justify-end gap-3",

                button {
                    class: "px-4 py-2 rounded-lg bg-slate-700 hover:bg-slate-600 text-sm",
                    disabled: deleting,
                    onclick: move |e| {
                        e.stop_propagation();
                        WORKBENCH.write().close_dialog();
                    },
                    if view.in_use { "Close" } else { "Cancel" }
                }

                if !view.in_use {
                    button {
                        class: "px-4 py-2 rounded-lg bg-rose-600 hover:bg-rose-500 text-sm font-medium",
                        disabled: !view.submit_enabled,
                        onclick: move |e| {
                            e.stop_propagation();
                            confirm();
                        },
                        if let Some(label) = &view.deleting { "{label}" } else { "Delete" }
                    }
                }
            }
        }
    }
}
