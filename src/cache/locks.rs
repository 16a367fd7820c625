//! Per-Key Lock Registry Module
//!
//! Hands out one reusable mutex per key so operations on the same key are
//! serialized while unrelated keys proceed in parallel.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use async_lock::{Mutex as KeyMutex, MutexGuardArc};
use parking_lot::Mutex;

// == Key Guard ==
/// Proof that the caller holds a key's critical section.
///
/// The mutex is released when the guard is dropped, including on unwind.
/// Internal helpers that must run inside a critical section take `&KeyGuard`
/// instead of acquiring again, which keeps nested calls from deadlocking.
#[must_use = "the key is unlocked as soon as the guard is dropped"]
pub struct KeyGuard {
    _guard: MutexGuardArc<()>,
}

impl fmt::Debug for KeyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard").finish_non_exhaustive()
    }
}

// == Key Lock Registry ==
/// Lazily created per-key mutexes.
///
/// Mutexes are never removed: the registry grows with the number of distinct
/// keys ever locked. The internal map lock is held only while looking up or
/// creating a mutex, never while one is being waited on.
pub struct KeyLockRegistry<K, S = RandomState> {
    locks: Mutex<HashMap<K, Arc<KeyMutex<()>>, S>>,
}

impl<K> KeyLockRegistry<K, RandomState>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty registry using the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K> Default for KeyLockRegistry<K, RandomState>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> KeyLockRegistry<K, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Creates an empty registry whose key identity follows `hasher`.
    ///
    /// The store passes a clone of its own map hasher here so that locking and
    /// storage agree on which keys are identical.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            locks: Mutex::new(HashMap::with_hasher(hasher)),
        }
    }

    fn mutex_for(&self, key: &K) -> Arc<KeyMutex<()>> {
        let mut locks = self.locks.lock();
        if let Some(mutex) = locks.get(key) {
            return Arc::clone(mutex);
        }
        let mutex = Arc::new(KeyMutex::new(()));
        locks.insert(key.clone(), Arc::clone(&mutex));
        mutex
    }

    // == Acquire ==
    /// Blocks the current thread until the key's mutex is held.
    pub fn acquire(&self, key: &K) -> KeyGuard {
        KeyGuard {
            _guard: self.mutex_for(key).lock_arc_blocking(),
        }
    }

    /// Waits for the key's mutex without occupying the thread.
    ///
    /// The returned guard is `Send` and may be held across `.await` points.
    pub async fn acquire_async(&self, key: &K) -> KeyGuard {
        let mutex = self.mutex_for(key);
        KeyGuard {
            _guard: mutex.lock_arc().await,
        }
    }

    /// Takes the key's mutex only if nobody holds it.
    pub fn try_acquire(&self, key: &K) -> Option<KeyGuard> {
        self.mutex_for(key)
            .try_lock_arc()
            .map(|guard| KeyGuard { _guard: guard })
    }

    // == Is Locked ==
    /// Returns true while some caller holds the key's critical section.
    ///
    /// Keys that were never locked are reported as unlocked without creating
    /// a mutex for them.
    pub fn is_locked(&self, key: &K) -> bool {
        let mutex = match self.locks.lock().get(key) {
            Some(mutex) => Arc::clone(mutex),
            None => return false,
        };
        let locked = mutex.try_lock().is_none();
        locked
    }

    // == Length ==
    /// Returns the number of keys that own a mutex.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

impl<K, S> fmt::Debug for KeyLockRegistry<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLockRegistry")
            .field("locks", &self.locks.lock().len())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_registry_creates_locks_lazily() {
        let registry: KeyLockRegistry<String> = KeyLockRegistry::new();
        assert!(registry.is_empty());

        let guard = registry.acquire(&"a".to_string());
        assert_eq!(registry.len(), 1);
        drop(guard);

        // Reacquiring reuses the same mutex
        let _guard = registry.acquire(&"a".to_string());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_guard_release_on_drop() {
        let registry: KeyLockRegistry<u32> = KeyLockRegistry::new();

        let guard = registry.acquire(&1);
        assert!(registry.is_locked(&1));
        assert!(registry.try_acquire(&1).is_none());

        drop(guard);
        assert!(!registry.is_locked(&1));
        assert!(registry.try_acquire(&1).is_some());
    }

    #[test]
    fn test_is_locked_unknown_key() {
        let registry: KeyLockRegistry<u32> = KeyLockRegistry::new();
        assert!(!registry.is_locked(&7));
        assert!(registry.is_empty(), "probing must not create a mutex");
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let registry: KeyLockRegistry<u32> = KeyLockRegistry::new();

        let _a = registry.acquire(&1);
        let b = registry.try_acquire(&2);
        assert!(b.is_some(), "other keys must stay available");
    }

    #[test]
    fn test_same_key_is_mutually_exclusive() {
        let registry = Arc::new(KeyLockRegistry::<u32>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                thread::spawn(move || {
                    let _guard = registry.acquire(&42);
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_async_acquire_without_runtime() {
        let registry = KeyLockRegistry::<u32>::new();

        let guard = tokio_test::block_on(registry.acquire_async(&3));
        assert!(registry.is_locked(&3));

        drop(guard);
        assert!(!registry.is_locked(&3));
    }

    #[tokio::test]
    async fn test_async_acquire_waits_for_release() {
        let registry = Arc::new(KeyLockRegistry::<u32>::new());
        let guard = registry.acquire_async(&1).await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let _guard = registry.acquire_async(&1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished(), "waiter must suspend while key is held");

        drop(guard);
        waiter.await.unwrap();
        assert!(!registry.is_locked(&1));
    }
}
