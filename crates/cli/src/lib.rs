//! # Confdesk CLI
//!
//! Command-line interface for Confdesk.
//!
//! Runs the same dialogs as the desktop shell, headless: a draft is built
//! from `--set` assignments, validated and saved through the entity store.
//!
//! ## Commands
//!
//! - `check` - Validate a console configuration
//! - `list` - List the entities of a component
//! - `render` - Print the dialog a component would show, as JSON
//! - `save` - Create, edit or clone an entity
//! - `delete` - Delete an entity
//!

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use confdesk_core::{Attributes, LifecycleMode, Value, display_value};
use confdesk_schema::{HookRegistry, load_config};
use confdesk_ui::{Console, DeleteOutcome, EntityDialog, EntityStore, SaveOutcome};
use std::path::PathBuf;

pub use confdesk_core;
pub use confdesk_schema;
pub use confdesk_ui;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "confdesk")]
#[command(about = "Schema-driven entity dialogs for administration consoles")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
    /// Console configuration (JSON or TOML)
    #[arg(long, short = 'c', env = "CONFDESK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// JSON file the entities are kept in (in-memory when omitted)
    #[arg(long, short = 's', env = "CONFDESK_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and list its components
    Check,
    /// List the entities of a component
    List {
        /// Component name
        component: String,
    },
    /// Print the dialog view as JSON
    Render {
        #[command(flatten)]
        target: DialogTarget,
    },
    /// Save a draft through a dialog
    Save {
        #[command(flatten)]
        target: DialogTarget,
    },
    /// Delete an entity
    Delete {
        /// Component name
        component: String,
        /// Entity name
        entity: String,
    },
}

/// Which dialog to open and what to put in its draft
#[derive(clap::Args, Debug)]
pub struct DialogTarget {
    /// Component name
    pub component: String,

    /// Lifecycle mode
    #[arg(long, short = 'm', value_enum, default_value_t = ModeArg::Create)]
    pub mode: ModeArg,

    /// Entity to edit or clone
    #[arg(long, short = 'e')]
    pub entity: Option<String>,

    /// Draft assignment `field=value`; values are read as JSON when they parse
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, Value)>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Create,
    Edit,
    Clone,
}

impl From<ModeArg> for LifecycleMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Create => LifecycleMode::Create,
            ModeArg::Edit => LifecycleMode::Edit,
            ModeArg::Clone => LifecycleMode::Clone,
        }
    }
}

/// Parse `field=value`
///
/// `port=8089` gives a number and `enabled=true` a boolean; anything that is
/// not valid JSON stays a string.
pub fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (field, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", s))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field.to_string(), value))
}

// ============================================================================
// Running
// ============================================================================

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .context("no configuration given (use --config or CONFDESK_CONFIG)")?;
    let config = load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let store = match &cli.store {
        Some(path) => EntityStore::open(path)?,
        None => EntityStore::new(),
    };
    let mut console = Console::load(config, store, &HookRegistry::with_builtins())?;

    match cli.command {
        Command::Check => check(&console),
        Command::List { component } => list(&console, &component),
        Command::Render { target } => render(&console, &target),
        Command::Save { target } => save(&console, &target),
        Command::Delete { component, entity } => delete(&mut console, &component, &entity),
    }
}

fn check(console: &Console) -> Result<()> {
    println!(
        "{} {}",
        "✓".green().bold(),
        console.config().display_name().bold()
    );
    for table in console.tables() {
        let kind = if table.kind.is_input() { "input" } else { "tab" };
        println!(
            "  {} {} ({}, {} fields)",
            table.name().cyan(),
            table.title(),
            kind,
            table.context.schema.fields().len()
        );
    }
    Ok(())
}

fn list(console: &Console, component: &str) -> Result<()> {
    let table = console.table(component)?;
    let collection = table.context.collection.borrow();
    if collection.entities().is_empty() {
        println!("{}", format!("No {} entities", table.title()).dimmed());
        return Ok(());
    }
    for entity in collection.entities() {
        let name = entity.name().unwrap_or_default();
        let summary: Vec<String> = entity
            .content()
            .iter()
            .filter(|(k, _)| !table.context.schema.encrypted().contains(k.as_str()))
            .filter(|(k, _)| k.as_str() != confdesk_core::NAME_ATTRIBUTE)
            .map(|(k, v)| format!("{}={}", k, display_value(v)))
            .collect();
        println!("{}  {}", name.bold(), summary.join(" ").dimmed());
    }
    Ok(())
}

/// Open the dialog a target names and fill its draft
fn open_dialog(console: &Console, target: &DialogTarget) -> Result<EntityDialog> {
    let mut dialog = console.open_entity_dialog(
        &target.component,
        target.mode.into(),
        target.entity.as_deref(),
    )?;
    let values: Attributes = target.set.iter().cloned().collect();
    if !values.is_empty() {
        dialog.set_fields(values)?;
    }
    Ok(dialog)
}

fn render(console: &Console, target: &DialogTarget) -> Result<()> {
    let mut dialog = open_dialog(console, target)?;
    let view = dialog.render();
    println!("{}", serde_json::to_string_pretty(&view)?);
    dialog.cancel();
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn save(console: &Console, target: &DialogTarget) -> Result<()> {
    let mut dialog = open_dialog(console, target)?;
    let outcome = runtime()?.block_on(dialog.submit())?;

    match outcome {
        SaveOutcome::Committed => {
            console.store().flush()?;
            println!(
                "{} Saved {} '{}'",
                "✓".green().bold(),
                target.component,
                dialog.handle().name().unwrap_or_default()
            );
            Ok(())
        }
        SaveOutcome::Invalid(validation) => {
            for error in &validation.errors {
                match &error.field {
                    Some(field) => eprintln!("{} {}: {}", "✗".red().bold(), field, error.message),
                    None => eprintln!("{} {}", "✗".red().bold(), error.message),
                }
            }
            bail!("draft is not valid")
        }
        SaveOutcome::RolledBack { message } => bail!("save failed: {}", message),
        SaveOutcome::NotInitiated => bail!("the entity store could not start the save"),
        SaveOutcome::Ignored => bail!("the dialog did not accept the submit"),
    }
}

fn delete(console: &mut Console, component: &str, entity: &str) -> Result<()> {
    let mut dialog = console.open_delete_dialog(component, entity)?;
    let table = console.table_mut(component)?;
    let outcome = runtime()?.block_on(dialog.confirm(&mut table.page))?;

    match outcome {
        DeleteOutcome::Deleted => {
            console.store().flush()?;
            println!("{} Deleted {} '{}'", "✓".green().bold(), component, entity);
            Ok(())
        }
        DeleteOutcome::InUse => bail!("'{}' is in use and cannot be deleted", entity),
        DeleteOutcome::Failed { message } => bail!("delete failed: {}", message),
        DeleteOutcome::NotInitiated => bail!("the entity store could not start the delete"),
        DeleteOutcome::Ignored => bail!("the dialog did not accept the delete"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("port=8089").unwrap(),
            ("port".to_string(), json!(8089))
        );
        assert_eq!(
            parse_assignment("enabled=true").unwrap(),
            ("enabled".to_string(), json!(true))
        );
        assert_eq!(
            parse_assignment("host=example.com").unwrap(),
            ("host".to_string(), json!("example.com"))
        );
        assert_eq!(
            parse_assignment("query=a=b").unwrap(),
            ("query".to_string(), json!("a=b"))
        );
        assert_eq!(parse_assignment("empty=").unwrap().1, json!(""));
    }

    #[test]
    fn test_parse_assignment_rejects_malformed() {
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(LifecycleMode::from(ModeArg::Create), LifecycleMode::Create);
        assert_eq!(LifecycleMode::from(ModeArg::Edit), LifecycleMode::Edit);
        assert_eq!(LifecycleMode::from(ModeArg::Clone), LifecycleMode::Clone);
    }

    #[test]
    fn test_cli_parses_save() {
        let cli = Cli::try_parse_from([
            "confdesk",
            "--config",
            "globalConfig.json",
            "save",
            "account",
            "--mode",
            "clone",
            "--entity",
            "acct1",
            "--set",
            "name=acct2",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("globalConfig.json")));
        match cli.command {
            Command::Save { target } => {
                assert_eq!(target.component, "account");
                assert_eq!(target.mode, ModeArg::Clone);
                assert_eq!(target.entity.as_deref(), Some("acct1"));
                assert_eq!(target.set, vec![("name".to_string(), json!("acct2"))]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
