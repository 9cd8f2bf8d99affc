//! Dedup command - drop lines already present in the ledger

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use csvbridge_core::{DedupReport, Line, OperationResult};

use super::{get_context, read_lines};
use crate::output;

#[derive(Serialize)]
struct DedupOutput<'a> {
    #[serde(flatten)]
    report: &'a DedupReport,
    lines: &'a [Line],
}

pub fn run(file: &Path, output_path: Option<&Path>, json: bool) -> Result<()> {
    let lines = read_lines(file)?;
    let ctx = get_context()?;

    let report = match ctx.deduplicate(&lines) {
        Ok(report) => report,
        Err(e) => {
            if json {
                let failed: OperationResult<()> = OperationResult::fail(e.to_string());
                println!("{}", serde_json::to_string_pretty(&failed)?);
            }
            return Err(e.into());
        }
    };

    if let Some(path) = output_path {
        let content = serde_json::to_string_pretty(&report.lines)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    }

    if json {
        let result = OperationResult::ok(DedupOutput {
            report: &report,
            lines: &report.lines,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if output_path.is_none() {
        // Lines own stdout; the summary goes to stderr
        println!("{}", serde_json::to_string_pretty(&report.lines)?);
        eprintln!("{}", summary(&report));
        return Ok(());
    }

    println!("{}", summary(&report));
    if report.lines.is_empty() {
        output::warning("Every line is already in the ledger. Nothing left to import.");
    } else if let Some(path) = output_path {
        output::success(&format!("Wrote {} lines to {}", report.lines_out, path.display()));
    }

    Ok(())
}

fn summary(report: &DedupReport) -> String {
    let mut table = output::create_table();
    table.set_header(vec!["Deduplication", ""]);
    table.add_row(vec!["Date window".to_string(), report.window.to_string()]);
    table.add_row(vec!["Ledger transactions".to_string(), report.remote_transactions.to_string()]);
    table.add_row(vec!["External ids".to_string(), report.external_ids.to_string()]);
    table.add_row(vec!["Lines in".to_string(), report.lines_in.to_string()]);
    table.add_row(vec!["Lines kept".to_string(), report.lines_out.to_string().green().to_string()]);
    table.add_row(vec!["Lines skipped".to_string(), report.lines_skipped().to_string()]);
    table.add_row(vec![
        "Transactions removed".to_string(),
        report.removed_transactions.to_string(),
    ]);
    table.to_string()
}
