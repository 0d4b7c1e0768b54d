// src/logging.rs
// =============================================================================
// Sets up `tracing` output for the CLI.
//
// - Console: stderr, so stdout stays clean for --json
// - File (--log): the same events, without ANSI colors
// - RUST_LOG directives are applied on top of the defaults
// =============================================================================

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("sitemapper={level}").parse()?)
        .add_directive("warn".parse()?);

    let console_layer = fmt::layer().with_target(verbose).with_writer(std::io::stderr);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = fs::File::create(path)?;
            let file_layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file));

            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(file_layer)
                .try_init()?;
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init()?;
        }
    }

    Ok(())
}
