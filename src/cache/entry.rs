//! Value Slot Module
//!
//! Wraps a stored value together with its expiration metadata.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::cache::ExpirationPolicy;

// == Value Slot ==
/// A stored value plus its expiration policy.
///
/// `value` is `None` only when the store keeps absent results. The last access
/// time is kept as an offset from `created_at` so a read under the key lock can
/// refresh a sliding deadline without exclusive access to the map.
#[derive(Debug)]
pub struct ValueSlot<V> {
    /// The stored value (`None` = stored absent marker)
    value: Option<V>,
    /// Expiration policy, fixed for the slot's lifetime
    policy: ExpirationPolicy,
    /// When the slot was created
    created_at: Instant,
    /// Nanoseconds between `created_at` and the last access
    accessed_offset_ns: AtomicU64,
}

impl<V> ValueSlot<V> {
    // == Constructor ==
    /// Creates a new slot stamped with the current time.
    pub fn new(value: Option<V>, policy: ExpirationPolicy) -> Self {
        Self::with_created_at(value, policy, Instant::now())
    }

    /// Creates a new slot with an explicit creation time.
    pub fn with_created_at(value: Option<V>, policy: ExpirationPolicy, created_at: Instant) -> Self {
        Self {
            value,
            policy,
            created_at,
            accessed_offset_ns: AtomicU64::new(0),
        }
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn policy(&self) -> &ExpirationPolicy {
        &self.policy
    }

    pub fn created(&self) -> Instant {
        self.created_at
    }

    /// Returns when the slot was last read (creation time if never read).
    pub fn last_accessed(&self) -> Instant {
        let offset = self.accessed_offset_ns.load(Ordering::Relaxed);
        self.created_at + Duration::from_nanos(offset)
    }

    // == Touch ==
    /// Records an access at `now`, moving a sliding deadline forward.
    pub fn touch(&self, now: Instant) {
        let offset = now.saturating_duration_since(self.created_at).as_nanos();
        let offset = u64::try_from(offset).unwrap_or(u64::MAX);
        self.accessed_offset_ns.fetch_max(offset, Ordering::Relaxed);
    }

    /// Copies the expiration state so it can be evaluated after the map lock
    /// is released.
    pub fn clock(&self) -> SlotClock {
        SlotClock {
            policy: self.policy.clone(),
            created_at: self.created_at,
            last_accessed: self.last_accessed(),
        }
    }

    // == Is Expired ==
    /// Checks if the slot is stale at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.policy
            .is_expired(self.created_at, self.last_accessed(), now)
    }

    /// Whether the slot's policy can ever expire.
    pub fn can_expire(&self) -> bool {
        self.policy.can_expire()
    }

    /// Returns the expiration instant, or None for policies without a deadline.
    pub fn expires_at(&self) -> Option<Instant> {
        self.policy.deadline(self.created_at, self.last_accessed())
    }

    // == Time Remaining ==
    /// Returns the time left before expiration.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the deadline has passed
    /// - `None` if the policy has no fixed deadline
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Consumes the slot, returning its value.
    pub fn into_value(self) -> Option<V> {
        self.value
    }

    /// Splits the slot into its value and policy.
    pub fn into_parts(self) -> (Option<V>, ExpirationPolicy) {
        (self.value, self.policy)
    }
}

// == Slot Clock ==
/// Expiration state of a slot at one point in time.
///
/// `Custom` predicates are user code; evaluating them on a clock instead of
/// the slot keeps them from running while the map lock is held.
#[derive(Debug, Clone)]
pub struct SlotClock {
    pub policy: ExpirationPolicy,
    pub created_at: Instant,
    pub last_accessed: Instant,
}

impl SlotClock {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.policy
            .is_expired(self.created_at, self.last_accessed, now)
    }

    pub fn can_expire(&self) -> bool {
        self.policy.can_expire()
    }
}
