//! Fetch command - list ledger transactions in a date range

use anyhow::{Context, Result};
use chrono::NaiveDate;

use csvbridge_core::domain::window::DATE_FORMAT;
use csvbridge_core::DateWindow;

use super::get_context;
use crate::output;

pub fn run(start: &str, end: Option<&str>, json: bool) -> Result<()> {
    let start = parse_day(start)?;
    let end = end.map(parse_day).transpose()?.unwrap_or(start);
    let window = DateWindow::new(start, end)?;

    let ctx = get_context()?;
    let gateway = ctx.gateway()?;
    let transactions = gateway.list_transactions_by_dates(window.start, window.end)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("No ledger transactions between {} and {}.", window.start_str(), window.end_str());
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Journal", "Date", "Amount", "Description", "External ID"]);
    for tx in &transactions {
        table.add_row(vec![
            tx.transaction_journal_id.clone().unwrap_or_default(),
            tx.date.clone().unwrap_or_default(),
            tx.amount.clone().unwrap_or_default(),
            tx.description.clone().unwrap_or_default(),
            tx.external_id.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    println!("{} transactions in {}", transactions.len(), window);

    Ok(())
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date \"{}\", expected YYYY-MM-DD", value))
}
