//! Cache Module
//!
//! Provides a concurrent key-value cache with single-flight population,
//! per-entry expiration policies and cancellable background eviction.

mod builder;
mod entry;
mod events;
mod locks;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use builder::CacheBuilder;
pub use entry::{SlotClock, ValueSlot};
pub use events::{
    ExpirationListener, ExpiredEvent, ExpiredResponse, ExpiringEvent, ExpiringResponse,
    FnExpired, FnExpiring,
};
pub use locks::{KeyGuard, KeyLockRegistry};
pub use policy::{ExpirationPolicy, ExpiryPredicate};
pub use stats::CacheStats;
pub use store::{CacheStore, Disposer, PolicyFactory};
