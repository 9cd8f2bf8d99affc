//! Window command - show the date range a batch covers

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use csvbridge_core::extract_date_range;

use super::read_lines;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let lines = read_lines(file)?;
    let window = extract_date_range(&lines)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&window)?);
        return Ok(());
    }

    println!("{} {} to {}", "Date window:".bold(), window.start_str(), window.end_str());
    println!("  {} lines, {} days", lines.len(), window.days());

    Ok(())
}
