//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions.

pub mod date_range;
pub mod dedup;
pub mod history;
pub mod logging;

pub use date_range::extract_date_range;
pub use dedup::{external_ids, filter_duplicates, DedupReport, DuplicationRemover, FilterOutcome};
pub use history::{RunHistory, RunRecord};
pub use logging::{init_tracing, TracingObserver};
