//! Expiration Policy Module
//!
//! Describes when a cached value becomes stale.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Predicate backing [`ExpirationPolicy::Custom`].
pub type ExpiryPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

// == Expiration Policy ==
/// When an entry becomes stale.
///
/// A policy is immutable once attached to a slot; storing a value with a
/// different policy creates a new slot.
#[derive(Clone, Default)]
pub enum ExpirationPolicy {
    /// The entry never expires
    #[default]
    Never,
    /// The entry expires a fixed duration after it was stored
    Absolute(Duration),
    /// The entry expires once it has not been accessed for the duration
    Sliding(Duration),
    /// The entry expires at a fixed instant
    At(Instant),
    /// The entry expires as soon as the predicate returns true.
    ///
    /// The predicate runs without the map lock but may run while a key lock
    /// is held, so it must not call back into the cache for its own key.
    Custom(ExpiryPredicate),
}

impl ExpirationPolicy {
    /// Builds a [`ExpirationPolicy::Custom`] policy from a closure.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        ExpirationPolicy::Custom(Arc::new(predicate))
    }

    /// Returns false only for [`ExpirationPolicy::Never`].
    pub fn can_expire(&self) -> bool {
        !matches!(self, ExpirationPolicy::Never)
    }

    /// Whether the deadline moves forward on each access.
    pub fn is_sliding(&self) -> bool {
        matches!(self, ExpirationPolicy::Sliding(_))
    }

    // == Deadline ==
    /// Computes the expiration instant of a slot.
    ///
    /// # Arguments
    /// * `created_at` - When the slot was stored
    /// * `last_access` - When the slot was last read
    ///
    /// # Returns
    /// - `None` for `Never` and `Custom`, which have no fixed deadline
    pub fn deadline(&self, created_at: Instant, last_access: Instant) -> Option<Instant> {
        match self {
            ExpirationPolicy::Never | ExpirationPolicy::Custom(_) => None,
            ExpirationPolicy::Absolute(ttl) => created_at.checked_add(*ttl),
            ExpirationPolicy::Sliding(idle) => last_access.checked_add(*idle),
            ExpirationPolicy::At(instant) => Some(*instant),
        }
    }

    // == Is Expired ==
    /// Checks the policy against `now`.
    ///
    /// An entry is expired once `now >= deadline`. A deadline that overflows
    /// `Instant` is treated as never reached.
    pub fn is_expired(&self, created_at: Instant, last_access: Instant, now: Instant) -> bool {
        match self {
            ExpirationPolicy::Custom(predicate) => predicate(),
            _ => self
                .deadline(created_at, last_access)
                .is_some_and(|deadline| now >= deadline),
        }
    }
}

impl fmt::Debug for ExpirationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpirationPolicy::Never => f.write_str("Never"),
            ExpirationPolicy::Absolute(d) => f.debug_tuple("Absolute").field(d).finish(),
            ExpirationPolicy::Sliding(d) => f.debug_tuple("Sliding").field(d).finish(),
            ExpirationPolicy::At(i) => f.debug_tuple("At").field(i).finish(),
            ExpirationPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for ExpirationPolicy {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExpirationPolicy::Never, ExpirationPolicy::Never) => true,
            (ExpirationPolicy::Absolute(a), ExpirationPolicy::Absolute(b)) => a == b,
            (ExpirationPolicy::Sliding(a), ExpirationPolicy::Sliding(b)) => a == b,
            (ExpirationPolicy::At(a), ExpirationPolicy::At(b)) => a == b,
            (ExpirationPolicy::Custom(a), ExpirationPolicy::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_never_does_not_expire() {
        let now = Instant::now();
        let policy = ExpirationPolicy::Never;

        assert!(!policy.can_expire());
        assert!(!policy.is_expired(now, now, now + Duration::from_secs(3600)));
        assert_eq!(policy.deadline(now, now), None);
    }

    #[test]
    fn test_absolute_boundary() {
        let start = Instant::now();
        let policy = ExpirationPolicy::Absolute(Duration::from_millis(100));

        assert!(policy.can_expire());
        assert!(!policy.is_expired(start, start, start + Duration::from_millis(99)));
        assert!(policy.is_expired(start, start, start + Duration::from_millis(100)));
    }

    #[test]
    fn test_absolute_ignores_access() {
        let start = Instant::now();
        let policy = ExpirationPolicy::Absolute(Duration::from_millis(100));
        let accessed = start + Duration::from_millis(90);

        assert!(policy.is_expired(start, accessed, start + Duration::from_millis(150)));
    }

    #[test]
    fn test_sliding_follows_last_access() {
        let start = Instant::now();
        let policy = ExpirationPolicy::Sliding(Duration::from_millis(100));
        let accessed = start + Duration::from_millis(90);

        assert!(policy.is_sliding());
        assert!(!policy.is_expired(start, accessed, start + Duration::from_millis(150)));
        assert!(policy.is_expired(start, accessed, start + Duration::from_millis(190)));
    }

    #[test]
    fn test_at_instant() {
        let start = Instant::now();
        let deadline = start + Duration::from_secs(5);
        let policy = ExpirationPolicy::At(deadline);

        assert_eq!(policy.deadline(start, start), Some(deadline));
        assert!(!policy.is_expired(start, start, start));
        assert!(policy.is_expired(start, start, deadline));
    }

    #[test]
    fn test_custom_predicate() {
        let flag = Arc::new(AtomicBool::new(false));
        let observed = flag.clone();
        let policy = ExpirationPolicy::custom(move || observed.load(Ordering::SeqCst));
        let now = Instant::now();

        assert!(policy.can_expire());
        assert!(!policy.is_expired(now, now, now));
        flag.store(true, Ordering::SeqCst);
        assert!(policy.is_expired(now, now, now));
    }

    #[test]
    fn test_policy_equality() {
        let custom = ExpirationPolicy::custom(|| false);
        assert_eq!(custom.clone(), custom);
        assert_ne!(custom, ExpirationPolicy::custom(|| false));
        assert_eq!(
            ExpirationPolicy::Absolute(Duration::from_secs(1)),
            ExpirationPolicy::Absolute(Duration::from_secs(1))
        );
        assert_ne!(
            ExpirationPolicy::Absolute(Duration::from_secs(1)),
            ExpirationPolicy::Sliding(Duration::from_secs(1))
        );
        assert_eq!(ExpirationPolicy::default(), ExpirationPolicy::Never);
    }
}
