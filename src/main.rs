//! Confdesk desktop
//!
//! Opens a console configuration in the Dioxus desktop shell.
//!
//! ```text
//! confdesk-desktop [globalConfig.json] [entities.json]
//! ```
//!
//! Without arguments a file picker asks for the configuration.

use confdesk_schema::load_config;
use confdesk_ui::StartupOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .pretty()
        .init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let config_path = args.next().or_else(pick_config);
    let store_path = args.next().or_else(|| std::env::var_os("CONFDESK_STORE").map(PathBuf::from));

    let Some(config_path) = config_path else {
        tracing::error!("No configuration selected");
        std::process::exit(2);
    };

    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };

    confdesk_ui::launch(StartupOptions { config, store_path });
}

fn pick_config() -> Option<PathBuf> {
    std::env::var_os("CONFDESK_CONFIG")
        .map(PathBuf::from)
        .or_else(|| {
            rfd::FileDialog::new()
                .set_title("Open console configuration")
                .add_filter("Configuration", &["json", "toml"])
                .pick_file()
        })
}
