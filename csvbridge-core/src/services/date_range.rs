//! Date range extraction for an import batch

use crate::domain::result::{Error, Result};
use crate::domain::{DateWindow, LedgerDate, Line};

/// Compute the smallest inclusive window covering every sub-transaction date
///
/// Dates from all lines are pooled. An empty batch, a batch without any
/// sub-transactions, or a date that does not parse is a validation error.
pub fn extract_date_range(lines: &[Line]) -> Result<DateWindow> {
    extract_counted(lines).map(|(window, _)| window)
}

/// Same as [`extract_date_range`], also returning how many dates were seen
pub(crate) fn extract_counted(lines: &[Line]) -> Result<(DateWindow, usize)> {
    if lines.is_empty() {
        return Err(Error::validation("Cannot deduplicate an empty batch of lines"));
    }

    let mut dates = lines
        .iter()
        .flat_map(|line| line.transactions.iter())
        .map(|tx| LedgerDate::parse(&tx.date))
        .collect::<Result<Vec<_>>>()?;

    let count = dates.len();
    let window = match count {
        0 => {
            return Err(Error::validation(
                "Batch contains no transactions to take dates from",
            ))
        }
        1 => DateWindow::single(dates[0].date),
        _ => {
            // Stable: among equal instants the first written keeps its place
            dates.sort_by_key(|d| d.instant);
            let (first, last) = (dates[0].date, dates[count - 1].date);
            // Mixed offsets can put the earliest instant on a later calendar day
            DateWindow::new(first.min(last), first.max(last))?
        }
    };

    Ok((window, count))
}
