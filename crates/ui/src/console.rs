//! Console model
//!
//! A [`Console`] ties a loaded configuration to an entity store: one table
//! per component, each with its resolved schema, collection and page. Both
//! the desktop shell and the command line open their dialogs through it.

use crate::collection::{Collection, PageState};
use crate::controller::{DialogContext, DialogRequest, EntityDialog};
use crate::delete::DeleteDialog;
use crate::entity::EntityHandle;
use crate::prompt::PromptBoard;
use crate::store::EntityStore;
use confdesk_core::{DialogError, DialogResult, LifecycleMode, Validatable};
use confdesk_schema::{AppConfig, ComponentKind, HookRegistry};
use std::rc::Rc;

/// One component's table
#[derive(Debug, Clone)]
pub struct ComponentTable {
    pub context: DialogContext,
    pub kind: ComponentKind,
    pub page: PageState,
}

impl ComponentTable {
    pub fn name(&self) -> &str {
        self.context.schema.name()
    }

    pub fn title(&self) -> &str {
        self.context.schema.title()
    }
}

/// Loaded configuration plus the entities it manages
#[derive(Debug)]
pub struct Console {
    config: AppConfig,
    store: EntityStore,
    prompts: PromptBoard,
    tables: Vec<ComponentTable>,
}

impl Console {
    /// Validate `config` and resolve every component against `registry`
    pub fn load(config: AppConfig, store: EntityStore, registry: &HookRegistry) -> DialogResult<Self> {
        config.validate()?;

        let prompts = PromptBoard::new();
        let transport = Rc::new(store.clone());
        let mut tables = Vec::new();

        for (component, kind) in config.components() {
            let collection =
                Collection::from_entities(component.name.clone(), store.list(&component.name))
                    .shared();
            let context = DialogContext::resolve(
                component,
                registry,
                collection,
                transport.clone(),
                prompts.clone(),
            )?
            .with_input(kind.is_input());
            tables.push(ComponentTable {
                context,
                kind,
                page: PageState::default(),
            });
        }

        tracing::info!(
            "Loaded console '{}' with {} components",
            config.display_name(),
            tables.len()
        );

        Ok(Self {
            config,
            store,
            prompts,
            tables,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn prompts(&self) -> &PromptBoard {
        &self.prompts
    }

    pub fn tables(&self) -> &[ComponentTable] {
        &self.tables
    }

    pub fn table(&self, component: &str) -> DialogResult<&ComponentTable> {
        self.tables
            .iter()
            .find(|t| t.name() == component)
            .ok_or_else(|| DialogError::ComponentNotFound(component.to_string()))
    }

    pub fn table_mut(&mut self, component: &str) -> DialogResult<&mut ComponentTable> {
        self.tables
            .iter_mut()
            .find(|t| t.name() == component)
            .ok_or_else(|| DialogError::ComponentNotFound(component.to_string()))
    }

    /// An entity of a component's collection
    pub fn entity(&self, component: &str, name: &str) -> DialogResult<EntityHandle> {
        self.table(component)?
            .context
            .collection
            .borrow()
            .find(name)
            .ok_or_else(|| DialogError::EntityNotFound {
                component: component.to_string(),
                name: name.to_string(),
            })
    }

    /// Open an add / edit / clone dialog
    ///
    /// Edit and clone need the name of an existing entity.
    pub fn open_entity_dialog(
        &self,
        component: &str,
        mode: LifecycleMode,
        name: Option<&str>,
    ) -> DialogResult<EntityDialog> {
        let table = self.table(component)?;
        let request = match (mode, name) {
            (LifecycleMode::Create, _) => DialogRequest::Create,
            (LifecycleMode::Edit, Some(name)) => DialogRequest::Edit(self.entity(component, name)?),
            (LifecycleMode::Clone, Some(name)) => {
                DialogRequest::Clone(self.entity(component, name)?)
            }
            (mode, None) => {
                return Err(DialogError::invalid_state(format!(
                    "a {} dialog needs an entity name",
                    mode
                )));
            }
        };
        EntityDialog::open(request, table.context.clone())
    }

    /// Open a delete confirmation
    pub fn open_delete_dialog(&self, component: &str, name: &str) -> DialogResult<DeleteDialog> {
        let handle = self.entity(component, name)?;
        DeleteDialog::open(handle, self.table(component)?.context.clone())
    }
}
