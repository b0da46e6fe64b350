//! # Entity Table Component
//!
//! Lists the active component's entities with their row actions.

use confdesk_core::{LifecycleMode, NAME_ATTRIBUTE, display_value};
use dioxus::prelude::*;

use crate::console::ComponentTable;
use crate::state::WORKBENCH;

/// Columns shown for a component: every non-encrypted field, name first
fn columns(table: &ComponentTable) -> Vec<(String, String)> {
    let schema = &table.context.schema;
    let mut columns: Vec<(String, String)> = schema
        .fields()
        .iter()
        .filter(|f| !f.encrypted && f.field != NAME_ATTRIBUTE)
        .map(|f| (f.field.clone(), f.display_label()))
        .take(4)
        .collect();
    columns.insert(
        0,
        (
            NAME_ATTRIBUTE.to_string(),
            schema.label(NAME_ATTRIBUTE).unwrap_or("Name").to_string(),
        ),
    );
    columns
}

/// One row per entity: name, then cell text per column
fn rows(table: &ComponentTable, columns: &[(String, String)]) -> Vec<(String, Vec<String>)> {
    table
        .context
        .collection
        .borrow()
        .entities()
        .iter()
        .map(|entity| {
            let name = entity.name().unwrap_or_default();
            let cells = columns
                .iter()
                .map(|(field, _)| entity.get(field).map(|v| display_value(&v)).unwrap_or_default())
                .collect();
            (name, cells)
        })
        .collect()
}

/// Table of the active component
#[component]
pub fn EntityTable() -> Element {
    let workbench = WORKBENCH.read();
    let Some(table) = workbench.active_table() else {
        return rsx! {
            div { class: "p-6 text-slate-400", "No component selected" }
        };
    };

    let title = table.title().to_string();
    let columns = columns(table);
    let rows = rows(table, &columns);
    let pagination = table.context.collection.borrow().pagination();
    drop(workbench);

    rsx! {
        div {
            class: "entity-table p-6 flex-1 overflow-auto",

            div {
                class: "flex items-center justify-between mb-4",
                h2 { class: "text-lg font-semibold", "{title}" }
                button {
                    class: "px-3 py-1.5 rounded-lg bg-indigo-600 hover:bg-indigo-500 text-sm",
                    onclick: move |_| WORKBENCH.write().open_entity_dialog(LifecycleMode::Create, None),
                    "Add"
                }
            }

            table {
                class: "w-full text-sm",
                thead {
                    tr {
                        for (_, label) in columns.iter() {
                            th { class: "text-left py-2 text-slate-400", "{label}" }
                        }
                        th { class: "text-right py-2 text-slate-400", "Actions" }
                    }
                }
                tbody {
                    for (name, cells) in rows.into_iter() {
                        tr {
                            key: "{name}",
                            class: "border-t border-slate-700",
                            for cell in cells.iter() {
                                td { class: "py-2", "{cell}" }
                            }
                            td {
                                class: "py-2 text-right space-x-2",
                                RowAction { name: name.clone(), action: RowActionKind::Edit }
                                RowAction { name: name.clone(), action: RowActionKind::Clone }
                                RowAction { name: name.clone(), action: RowActionKind::Delete }
                            }
                        }
                    }
                }
            }

            p {
                class: "mt-4 text-xs text-slate-500",
                "{pagination.total} items"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowActionKind {
    Edit,
    Clone,
    Delete,
}

#[component]
fn RowAction(name: String, action: RowActionKind) -> Element {
    let label = match action {
        RowActionKind::Edit => "Edit",
        RowActionKind::Clone => "Clone",
        RowActionKind::Delete => "Delete",
    };

    rsx! {
        button {
            class: "px-2 py-1 rounded bg-slate-700 hover:bg-slate-600 text-xs",
            onclick: move |_| {
                let mut workbench = WORKBENCH.write();
                match action {
                    RowActionKind::Edit => workbench.open_entity_dialog(LifecycleMode::Edit, Some(&name)),
                    RowActionKind::Clone => workbench.open_entity_dialog(LifecycleMode::Clone, Some(&name)),
                    RowActionKind::Delete => workbench.open_delete_dialog(&name),
                }
            },
            "{label}"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use crate::store::EntityStore;
    use confdesk_schema::{AppConfig, ComponentConfig, FieldDescriptor, HookRegistry};
    use serde_json::json;

    #[test]
    fn test_columns_and_rows() {
        let store = EntityStore::new();
        store.insert(
            "account",
            "acct1",
            json!({"host": "h1", "secret": "x"}).as_object().cloned().unwrap(),
        );
        let config = AppConfig::new("demo").with_tab(
            ComponentConfig::new("account", "Account")
                .with_field(FieldDescriptor::new("name", "Account Name"))
                .with_field(FieldDescriptor::new("secret", "Secret").encrypted())
                .with_field(FieldDescriptor::new("host", "")),
        );
        let console = Console::load(config, store, &HookRegistry::new()).unwrap();
        let table = console.table("account").unwrap();

        let columns = columns(table);
        assert_eq!(
            columns,
            vec![
                ("name".to_string(), "Account Name".to_string()),
                ("host".to_string(), "Host".to_string()),
            ]
        );
        assert_eq!(
            rows(table, &columns),
            vec![(
                "acct1".to_string(),
                vec!["acct1".to_string(), "h1".to_string()]
            )]
        );
    }
}
