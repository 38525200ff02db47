//! Remote schedule access: a tariff-data service as a candidate source, and
//! the compliance audit endpoint that receives finished analyses.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{ScheduleClient, SyncError};
