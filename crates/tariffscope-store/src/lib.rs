//! Candidate sources: in-memory (JSON, Arrow, Parquet) and DuckDB-backed schedules.

mod error;
pub use error::StoreError;

pub mod audit;
mod schedule;
mod source;

pub use audit::{assumption_batch, write_assumptions};
pub use schedule::{Schedule, leaves_from_batches, read_parquet};
pub use source::{CandidateSource, Memoized, Timed};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckSchedule;
