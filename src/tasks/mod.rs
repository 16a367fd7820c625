//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - Expiration sweep: evicts expired cache entries at the configured interval

mod sweeper;

pub use sweeper::SweepReport;
pub(crate) use sweeper::{SweepTarget, Sweeper};
