//! CLI command implementations

pub mod config;
pub mod dedup;
pub mod fetch;
pub mod history;
pub mod window;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csvbridge_core::{BridgeContext, Line};

/// Get the csvbridge directory from environment or default
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CSVBRIDGE_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".csvbridge")
    }
}

/// Get or create the csvbridge context
pub fn get_context() -> Result<BridgeContext> {
    let config_dir = get_config_dir();

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create csvbridge directory: {:?}", config_dir))?;

    BridgeContext::new(&config_dir).context("Failed to initialize csvbridge context")
}

/// Read a JSON array of lines
pub fn read_lines(path: &Path) -> Result<Vec<Line>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("{:?} is not a JSON array of lines", path))
}

/// Format unix milliseconds for tables
pub fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{TimeZone, Utc};
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
