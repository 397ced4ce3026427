use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::config::AppConfig;
use crate::trace::TraceEvent;

/// Installs the process subscriber: stderr always, plus an append-only log
/// file when one is configured. Call once from `main`.
pub fn init(cfg: &AppConfig) -> Result<()> {
    let level = LevelFilter::from_level(cfg.log_level);
    let file_layer = match cfg.log_file.as_deref() {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(level)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Sink for the rating engine's trace events.
pub fn log_trace_event(event: TraceEvent) {
    match event {
        TraceEvent::Skipped {
            index,
            home,
            away,
            reason,
        } => tracing::warn!(index, %home, %away, "skipped match: {reason}"),
        TraceEvent::Completed { rows, skipped } => {
            tracing::info!(rows, skipped, "match trace computed")
        }
    }
}
