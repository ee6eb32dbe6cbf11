// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "FIELDCOST_LOG";

/// Installs the global subscriber writing to the configured log file.
///
/// The terminal belongs to the TUI, so nothing is written to stdout or stderr.
pub fn init(config: &Config) -> Result<PathBuf> {
    let path = config.log_file()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let directive = filter_directive(env::var(LOG_FILTER_ENV).ok().as_deref(), config.log_level());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?} (from {LOG_FILTER_ENV} or [log].level)"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("initialize logging: {error}"))?;
    Ok(path)
}

fn filter_directive(env_value: Option<&str>, config_level: &str) -> String {
    match env_value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => config_level.to_owned(),
    }
}
