//! Lazy Cache - A concurrent in-process key-value cache
//!
//! Computes each value at most once per key even under concurrent access,
//! attaches an expiration policy to every stored value and evicts expired
//! entries from a background sweeper with cancellable notifications.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    CacheBuilder, CacheStats, CacheStore, ExpirationListener, ExpirationPolicy, ExpiredEvent,
    ExpiredResponse, ExpiringEvent, ExpiringResponse,
};
pub use config::CacheConfig;
pub use error::{BoxError, CacheError, Result};
pub use tasks::SweepReport;
