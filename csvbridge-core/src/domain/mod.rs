//! Core domain entities
//!
//! Pure data structures for one reconciliation run - no I/O here.

mod line;
mod remote;
pub mod result;
pub mod window;

pub use line::{Line, SubTransaction};
pub use remote::{RemoteTransaction, TransactionGroup};
pub use window::{DateWindow, LedgerDate};
