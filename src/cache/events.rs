//! Expiration Notifications Module
//!
//! Request/response pairs raised around each eviction, whether the sweeper
//! found the entry expired or a caller removed it.
//!
//! - `expiring` fires before removal; a listener may cancel the eviction and
//!   supply the policy the entry is kept with.
//! - `expired` fires after removal; a listener may decide whether the value is
//!   handed to the store's disposer.

use crate::cache::ExpirationPolicy;
use crate::error::BoxError;

// == Expiring ==
/// Raised once per eviction attempt, before the entry is removed.
#[derive(Debug)]
pub struct ExpiringEvent<'a, K, V> {
    pub key: &'a K,
    /// `None` when the stored value is the absent marker
    pub value: Option<&'a V>,
    pub policy: &'a ExpirationPolicy,
}

/// Answer to an [`ExpiringEvent`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpiringResponse {
    /// Keep the entry instead of evicting it
    pub cancel: bool,
    /// Policy the kept entry is re-inserted with. `None` keeps the entry's
    /// current policy with a restarted timer; a `Never` entry falls back to
    /// the store's default policy.
    pub policy: Option<ExpirationPolicy>,
}

impl ExpiringResponse {
    /// Lets the eviction proceed.
    pub fn proceed() -> Self {
        Self::default()
    }

    /// Keeps the entry, re-inserting it with `policy` (or the fallback).
    pub fn keep(policy: Option<ExpirationPolicy>) -> Self {
        Self {
            cancel: true,
            policy,
        }
    }
}

// == Expired ==
/// Raised once per completed eviction, after the entry left the map.
#[derive(Debug)]
pub struct ExpiredEvent<'a, K, V> {
    pub key: &'a K,
    pub value: Option<&'a V>,
    /// Current decision; starts at the store's `dispose_values_on_removal`
    pub dispose: bool,
}

/// Answer to an [`ExpiredEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiredResponse {
    pub dispose: bool,
}

// == Listener Trait ==
/// Receives expiration notifications from the sweeper and from `remove`.
///
/// Handlers run while the entry's key lock is held: calling back into the
/// cache for the *same* key deadlocks, other keys are fine. An `Err` aborts
/// the current sweep tick or fails the `remove` call.
pub trait ExpirationListener<K, V>: Send + Sync {
    fn on_expiring(
        &self,
        _event: &ExpiringEvent<'_, K, V>,
    ) -> Result<ExpiringResponse, BoxError> {
        Ok(ExpiringResponse::proceed())
    }

    fn on_expired(&self, event: &ExpiredEvent<'_, K, V>) -> Result<ExpiredResponse, BoxError> {
        Ok(ExpiredResponse {
            dispose: event.dispose,
        })
    }
}

/// An `expiring` handler backed by a closure.
pub struct FnExpiring<F>(pub F);

impl<K, V, F> ExpirationListener<K, V> for FnExpiring<F>
where
    F: Fn(&ExpiringEvent<'_, K, V>) -> Result<ExpiringResponse, BoxError> + Send + Sync,
{
    fn on_expiring(
        &self,
        event: &ExpiringEvent<'_, K, V>,
    ) -> Result<ExpiringResponse, BoxError> {
        (self.0)(event)
    }
}

/// An `expired` handler backed by a closure.
pub struct FnExpired<F>(pub F);

impl<K, V, F> ExpirationListener<K, V> for FnExpired<F>
where
    F: Fn(&ExpiredEvent<'_, K, V>) -> Result<ExpiredResponse, BoxError> + Send + Sync,
{
    fn on_expired(&self, event: &ExpiredEvent<'_, K, V>) -> Result<ExpiredResponse, BoxError> {
        (self.0)(event)
    }
}
