#![forbid(unsafe_code)]

mod constants;
mod generator;
mod gui;
mod history;
mod ini;
mod keymap;
mod restart;
mod settings;
mod store;
mod text;
mod update;
mod version;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use constants::app;
use settings::AppSettings;
use store::ConfigStore;

/// Config editor and TOML generator for module pose/scale mods.
///
/// Without arguments the GUI editor opens. Dropping a game archive onto the
/// executable (or passing it as an argument) runs the generator instead.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Game archive(s) to convert to TOML tables
    files: Vec<PathBuf>,

    /// Only refresh the shared release status file, then exit
    #[arg(long)]
    check_update: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = ConfigStore::open().context("Failed to open configuration store")?;
    let main_doc = store.load_document(&store.main_config_path())?;
    let settings = AppSettings::from_doc(&main_doc);

    let log_file = if settings.debug.output_log {
        let mode = if cli.files.is_empty() { "editor" } else { "generator" };
        Some((store.logs_dir(), format!("{mode}.log")))
    } else {
        None
    };
    init_logging(log_file)?;
    info!(version = app::VERSION, "Starting up");

    if cli.check_update {
        update::check_update(
            &store.update_status_path(),
            app::EDITOR_TOOL,
            app::VERSION,
            true,
        );
        return Ok(());
    }

    if cli.files.is_empty() {
        gui::run_editor(store)
    } else {
        generator::run(&store, &cli.files)
    }
}

/// Log level comes from the LOG_LEVEL environment variable; when file
/// logging is enabled in the debug settings, output goes to a log file in
/// `logs/` instead of the console.
fn init_logging(log_file: Option<(PathBuf, String)>) -> Result<()> {
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    match log_file {
        Some((dir, file_name)) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let path = dir.join(file_name);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
