// Tracing subscriber setup

use crate::error::Result;
use anyhow::Context;
use chrono::Local;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Daily log file for one area, e.g. `monitor_2025-01-31.log`
pub fn log_file_path(log_dir: &Path, stem: &str) -> PathBuf {
    log_dir.join(format!("{}_{}.log", stem, Local::now().format("%Y-%m-%d")))
}

/// Log to stdout and append to today's file in `log_dir`
pub fn init(log_dir: &Path, stem: &str, debug: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let path = log_file_path(log_dir, stem);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stdout.and(Mutex::new(log_file)))
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(path)
}
