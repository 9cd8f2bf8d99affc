//! History command - view and prune recorded deduplication runs

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;

use csvbridge_core::services::RunHistory;

use super::{format_timestamp, get_config_dir};
use crate::output;

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Show recent runs
    List {
        /// Number of runs to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Show only failed runs
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old runs
    Clear {
        /// Delete runs older than N days
        #[arg(long, default_value = "30")]
        older_than_days: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Epoch millis `days` before `now`
fn cutoff_millis(now: DateTime<Utc>, days: i64) -> Result<i64> {
    if days < 0 {
        anyhow::bail!("--older-than-days must not be negative");
    }
    let cutoff = Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| anyhow::anyhow!("--older-than-days {} is out of range", days))?;
    Ok(cutoff.timestamp_millis())
}

fn open_history() -> Result<RunHistory> {
    let config_dir = get_config_dir();
    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create csvbridge directory: {:?}", config_dir))?;
    RunHistory::open(&config_dir)
}

pub fn run(command: HistoryCommands) -> Result<()> {
    match command {
        HistoryCommands::List { limit, errors, json } => {
            let history = open_history()?;
            let runs = if errors {
                history.errors(limit)?
            } else {
                history.recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&runs)?);
                return Ok(());
            }

            if runs.is_empty() {
                println!("No runs recorded.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Window", "Lines in", "Kept", "Removed", "Status"]);

            for run in &runs {
                let window = match (&run.window_start, &run.window_end) {
                    (Some(start), Some(end)) => format!("{}..{}", start, end),
                    _ => "-".to_string(),
                };
                let status = match &run.error_message {
                    Some(_) => "failed".red().to_string(),
                    None => "ok".green().to_string(),
                };

                table.add_row(vec![
                    format_timestamp(run.timestamp),
                    window,
                    run.lines_in.to_string(),
                    run.lines_out.to_string(),
                    run.removed_transactions.to_string(),
                    status,
                ]);
            }

            println!("{}", table);

            let failures: Vec<_> = runs.iter().filter(|r| r.is_error()).take(3).collect();
            if !failures.is_empty() {
                println!();
                println!("{}", "Recent Errors:".red().bold());
                for run in failures {
                    println!(
                        "  {}: {}",
                        format_timestamp(run.timestamp).dimmed(),
                        run.error_message.as_deref().unwrap_or_default()
                    );
                }
            }

            Ok(())
        }
        HistoryCommands::Clear { older_than_days, json } => {
            let history = open_history()?;
            let cutoff = cutoff_millis(Utc::now(), older_than_days)?;
            let deleted = history.delete_before(cutoff)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&json!({ "deleted": deleted }))?);
            } else {
                output::success(&format!(
                    "Deleted {} runs older than {} days",
                    deleted, older_than_days
                ));
            }

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cutoff_millis() {
        let now = Utc.with_ymd_and_hms(2020, 1, 31, 0, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(cutoff_millis(now, 30).unwrap(), expected.timestamp_millis());
        assert_eq!(cutoff_millis(now, 0).unwrap(), now.timestamp_millis());
    }

    #[test]
    fn test_cutoff_millis_rejects_out_of_range_days() {
        let now = Utc::now();
        assert!(cutoff_millis(now, i64::MAX).is_err());
        assert!(cutoff_millis(now, 1_000_000_000).is_err());
        assert!(cutoff_millis(now, -1).is_err());
    }
}
