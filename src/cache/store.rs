//! Cache Store Module
//!
//! Main cache engine: a key to slot map whose every operation runs under the
//! key's lock, plus the bookkeeping that drives the expiration sweeper.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::hash::{BuildHasher, Hash};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::cache::builder::CacheBuilder;
use crate::cache::events::{
    ExpirationListener, ExpiredEvent, ExpiredResponse, ExpiringEvent, ExpiringResponse,
    FnExpired, FnExpiring,
};
use crate::cache::stats::StatsRecorder;
use crate::cache::{
    CacheStats, ExpirationPolicy, KeyGuard, KeyLockRegistry, SlotClock, ValueSlot,
};
use crate::config::CacheConfig;
use crate::error::{BoxError, CacheError, Result};
use crate::tasks::{SweepReport, SweepTarget, Sweeper};

/// Supplies a policy when a value is stored without one.
pub type PolicyFactory = Arc<dyn Fn() -> ExpirationPolicy + Send + Sync>;

/// Releases the resources owned by a removed value.
pub type Disposer<K, V> = Arc<dyn Fn(&K, V) + Send + Sync>;

type Listener<K, V> = Arc<dyn ExpirationListener<K, V>>;

// == Cache Store ==
/// Concurrent key-value cache with single-flight population and time-based
/// expiration.
///
/// Cloning is cheap and yields another handle to the same cache. The
/// background sweeper stops once the last handle is dropped.
///
/// # Example
/// ```
/// use lazy_cache::{CacheStore, ExpirationPolicy};
///
/// let cache: CacheStore<String, u32> = CacheStore::new();
/// let value = cache.get_or_fetch("answer".to_string(), || Some(42), ExpirationPolicy::Never, false);
/// assert_eq!(value, Some(42));
/// assert_eq!(cache.get(&"answer".to_string()), Some(42));
/// ```
pub struct CacheStore<K, V, S = RandomState> {
    inner: Arc<Shared<K, V, S>>,
}

impl<K, V, S> Clone for CacheStore<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Store-level options fixed at construction.
pub(crate) struct StoreOptions<K, V> {
    pub(crate) config: CacheConfig,
    pub(crate) default_policy: Option<PolicyFactory>,
    pub(crate) disposer: Option<Disposer<K, V>>,
    pub(crate) listeners: Vec<Listener<K, V>>,
}

/// Has-expirable flag and sweeper state, guarded by one short-lived lock.
struct Bookkeeping {
    has_expirable: bool,
    /// Bumped on every expirable store so a sweep or clear can tell whether
    /// an expirable entry arrived while it was running.
    generation: u64,
    interval: Duration,
    sweeper: Option<Sweeper>,
}

pub(crate) struct Shared<K, V, S> {
    this: Weak<Self>,
    map: RwLock<HashMap<K, ValueSlot<V>, S>>,
    locks: KeyLockRegistry<K, S>,
    bookkeeping: Mutex<Bookkeeping>,
    listeners: RwLock<Vec<Listener<K, V>>>,
    default_policy: Option<PolicyFactory>,
    disposer: Option<Disposer<K, V>>,
    store_absent_values: bool,
    dispose_values_on_removal: bool,
    stats: StatsRecorder,
}

/// Why a slot is leaving the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Expired,
    Explicit,
}

/// What happened to one key during an eviction attempt.
enum Eviction {
    Evicted,
    Kept { can_expire: bool },
    Live { can_expire: bool },
    Missing,
}

impl<K, V> CacheStore<K, V, RandomState>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache with default options.
    pub fn new() -> Self {
        Self::from_options(
            RandomState::new(),
            StoreOptions {
                config: CacheConfig::default(),
                default_policy: None,
                disposer: None,
                listeners: Vec::new(),
            },
        )
    }

    /// Starts configuring a cache.
    pub fn builder() -> CacheBuilder<K, V> {
        CacheBuilder::new()
    }

    /// Creates a cache from plain configuration values.
    ///
    /// # Errors
    /// `InvalidArgument` if the sweep interval is zero.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        CacheBuilder::new().config(config.clone()).build()
    }
}

impl<K, V> Default for CacheStore<K, V, RandomState>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> CacheStore<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync + 'static,
{
    /// Builds the store. The same hasher keys both the map and the lock
    /// registry so they agree on key identity.
    pub(crate) fn from_options(hasher: S, options: StoreOptions<K, V>) -> Self {
        let inner = Arc::new_cyclic(|this| Shared {
            this: this.clone(),
            map: RwLock::new(HashMap::with_hasher(hasher.clone())),
            locks: KeyLockRegistry::with_hasher(hasher),
            bookkeeping: Mutex::new(Bookkeeping {
                has_expirable: false,
                generation: 0,
                interval: options.config.sweep_interval,
                sweeper: None,
            }),
            listeners: RwLock::new(options.listeners),
            default_policy: options.default_policy,
            disposer: options.disposer,
            store_absent_values: options.config.store_absent_values,
            dispose_values_on_removal: options.config.dispose_values_on_removal,
            stats: StatsRecorder::default(),
        });
        Self { inner }
    }

    // == Get ==
    /// Returns the value stored under `key` if it has not expired.
    ///
    /// A hit refreshes the access time of a sliding entry; nothing else is
    /// modified. A stored absent marker also reads as `None`.
    pub fn get(&self, key: &K) -> Option<V> {
        let guard = self.inner.locks.acquire(key);
        self.inner.read_live_locked(key, &guard).flatten()
    }

    /// Like [`get`](Self::get), but waits for the key lock without blocking
    /// the thread.
    pub async fn get_async(&self, key: &K) -> Option<V> {
        let guard = self.inner.locks.acquire_async(key).await;
        self.inner.read_live_locked(key, &guard).flatten()
    }

    // == Contains ==
    /// Returns true if a slot exists for `key`.
    ///
    /// Expired slots that have not been swept yet still count.
    pub fn contains(&self, key: &K) -> bool {
        let _guard = self.inner.locks.acquire(key);
        self.inner.map.read().contains_key(key)
    }

    pub async fn contains_async(&self, key: &K) -> bool {
        let _guard = self.inner.locks.acquire_async(key).await;
        self.inner.map.read().contains_key(key)
    }

    // == Get Or Fetch ==
    /// Returns the live value for `key`, computing and storing it if needed.
    ///
    /// `compute` runs while the key lock is held, so concurrent callers for
    /// the same key wait for the first computation and then read its result.
    /// A `None` result is returned but only stored when the cache keeps
    /// absent values.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `compute` - Produces the value on a miss (or always, with `overwrite`)
    /// * `policy` - Policy for a newly stored value; `None` uses the default
    /// * `overwrite` - Recompute even if a live value exists
    pub fn get_or_fetch<F>(
        &self,
        key: K,
        compute: F,
        policy: impl Into<Option<ExpirationPolicy>>,
        overwrite: bool,
    ) -> Option<V>
    where
        F: FnOnce() -> Option<V>,
    {
        match self.try_get_or_fetch(key, || Ok::<_, Infallible>(compute()), policy, overwrite) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get_or_fetch`](Self::get_or_fetch).
    ///
    /// # Errors
    /// The error returned by `compute`, unchanged. Nothing is stored and the
    /// next call computes again.
    pub fn try_get_or_fetch<F, E>(
        &self,
        key: K,
        compute: F,
        policy: impl Into<Option<ExpirationPolicy>>,
        overwrite: bool,
    ) -> std::result::Result<Option<V>, E>
    where
        F: FnOnce() -> std::result::Result<Option<V>, E>,
    {
        let policy = policy.into();
        let guard = self.inner.locks.acquire(&key);

        if !overwrite {
            if let Some(existing) = self.inner.read_live_locked(&key, &guard) {
                return Ok(existing);
            }
        }

        let value = compute()?;
        self.inner.stats.record_compute();
        self.inner
            .store_computed_locked(key, value.clone(), policy, &guard);
        Ok(value)
    }

    /// Suspending form of [`get_or_fetch`](Self::get_or_fetch).
    ///
    /// The key lock is held across the `compute` future's await points.
    pub async fn get_or_fetch_async<F, Fut>(
        &self,
        key: K,
        compute: F,
        policy: impl Into<Option<ExpirationPolicy>>,
        overwrite: bool,
    ) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<V>>,
    {
        let fetched = self
            .try_get_or_fetch_async(
                key,
                || async move { Ok::<_, Infallible>(compute().await) },
                policy,
                overwrite,
            )
            .await;
        match fetched {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Suspending form of [`try_get_or_fetch`](Self::try_get_or_fetch).
    pub async fn try_get_or_fetch_async<F, Fut, E>(
        &self,
        key: K,
        compute: F,
        policy: impl Into<Option<ExpirationPolicy>>,
        overwrite: bool,
    ) -> std::result::Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<V>, E>>,
    {
        let policy = policy.into();
        let guard = self.inner.locks.acquire_async(&key).await;

        if !overwrite {
            if let Some(existing) = self.inner.read_live_locked(&key, &guard) {
                return Ok(existing);
            }
        }

        let value = compute().await?;
        self.inner.stats.record_compute();
        self.inner
            .store_computed_locked(key, value.clone(), policy, &guard);
        Ok(value)
    }

    // == Add ==
    /// Stores `value` under `key`.
    ///
    /// Without `overwrite`, a live value already stored is kept and returned
    /// instead.
    pub fn add(
        &self,
        key: K,
        value: V,
        policy: impl Into<Option<ExpirationPolicy>>,
        overwrite: bool,
    ) -> Option<V> {
        self.get_or_fetch(key, move || Some(value), policy, overwrite)
    }

    pub async fn add_async(
        &self,
        key: K,
        value: V,
        policy: impl Into<Option<ExpirationPolicy>>,
        overwrite: bool,
    ) -> Option<V> {
        self.get_or_fetch_async(key, move || async move { Some(value) }, policy, overwrite)
            .await
    }

    // == Remove ==
    /// Removes the slot stored under `key`.
    ///
    /// The removal raises `expiring` and `expired` just like an eviction, so
    /// an `expiring` listener may keep the entry. Removing an absent key is a
    /// no-op that succeeds without raising anything.
    ///
    /// # Returns
    /// - `Ok(true)` once the key holds no slot, including when it had none
    /// - `Ok(false)` if an `expiring` listener kept the entry
    ///
    /// # Errors
    /// `Notification` if a listener fails. An `expiring` failure leaves the
    /// slot in place; an `expired` failure happens after the slot is gone.
    pub fn remove(&self, key: &K) -> Result<bool> {
        let guard = self.inner.locks.acquire(key);
        self.inner.remove_locked(key, None::<fn()>, &guard)
    }

    /// Removes the slot stored under `key`, running `side_effect` under the
    /// same key lock before the removal's notifications fire.
    ///
    /// `side_effect` only runs if a slot is present.
    pub fn remove_with<F>(&self, key: &K, side_effect: F) -> Result<bool>
    where
        F: FnOnce(),
    {
        let guard = self.inner.locks.acquire(key);
        self.inner.remove_locked(key, Some(side_effect), &guard)
    }

    pub async fn remove_async(&self, key: &K) -> Result<bool> {
        let guard = self.inner.locks.acquire_async(key).await;
        self.inner.remove_locked(key, None::<fn()>, &guard)
    }

    // == Clear ==
    /// Removes every entry, one key lock at a time.
    ///
    /// Unlike [`remove`](Self::remove), clearing raises no notifications;
    /// values are still disposed when `dispose_values_on_removal` is set. The
    /// sweeper goes idle unless an expirable entry was stored while the
    /// clear was running.
    pub fn clear(&self) {
        let generation = self.inner.bookkeeping.lock().generation;
        let keys = self.keys();

        for key in &keys {
            let guard = self.inner.locks.acquire(key);
            self.inner.discard_locked(key, &guard);
        }

        self.inner.go_idle_unless_changed(generation);
        debug!(removed = keys.len(), "Cache cleared");
    }

    // == Sweep ==
    /// Runs one expiration sweep on the calling thread.
    ///
    /// # Errors
    /// `Notification` if an expiration handler fails. Keys after the failing
    /// one are left for the next sweep.
    pub fn sweep_expired(&self) -> Result<SweepReport> {
        self.inner.sweep()
    }

    // == Listeners ==
    /// Registers a listener for expiration notifications.
    pub fn subscribe<L>(&self, listener: L)
    where
        L: ExpirationListener<K, V> + 'static,
    {
        self.inner.listeners.write().push(Arc::new(listener));
    }

    /// Registers a closure answering `expiring` notifications.
    pub fn on_expiring<F>(&self, handler: F)
    where
        F: Fn(&ExpiringEvent<'_, K, V>) -> std::result::Result<ExpiringResponse, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.subscribe(FnExpiring(handler));
    }

    /// Registers a closure answering `expired` notifications.
    pub fn on_expired<F>(&self, handler: F)
    where
        F: Fn(&ExpiredEvent<'_, K, V>) -> std::result::Result<ExpiredResponse, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.subscribe(FnExpired(handler));
    }

    // == Sweep Interval ==
    pub fn sweep_interval(&self) -> Duration {
        self.inner.bookkeeping.lock().interval
    }

    /// Changes the sweep interval; an active sweeper keeps running with the
    /// new interval.
    ///
    /// # Errors
    /// `InvalidArgument` if `interval` is zero.
    pub fn set_sweep_interval(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(CacheError::InvalidArgument(
                "sweep interval must be greater than zero".to_string(),
            ));
        }

        let mut bookkeeping = self.inner.bookkeeping.lock();
        bookkeeping.interval = interval;
        if let Some(sweeper) = &bookkeeping.sweeper {
            sweeper.reprogram(interval);
        }
        Ok(())
    }

    /// Returns true while the background sweeper is running.
    pub fn is_sweeper_active(&self) -> bool {
        self.inner.bookkeeping.lock().sweeper.is_some()
    }

    /// Returns true if an expirable entry may still be stored.
    pub fn has_expirable_entries(&self) -> bool {
        self.inner.bookkeeping.lock().has_expirable
    }

    // == Introspection ==
    /// Returns a snapshot of the stored keys, expired ones included.
    pub fn keys(&self) -> Vec<K> {
        self.inner.map.read().keys().cloned().collect()
    }

    /// Returns the number of slots, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.map.read().is_empty()
    }

    /// Returns the number of per-key locks created so far.
    ///
    /// Locks are never released, so this grows with every distinct key ever
    /// used, including keys that were only read.
    pub fn key_lock_count(&self) -> usize {
        self.inner.locks.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.len())
    }
}

impl<K, V, S> Shared<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync + 'static,
{
    /// Reads a live slot. The outer `Option` tells whether a live slot
    /// exists, the inner one is the stored value.
    fn read_live_locked(&self, key: &K, _guard: &KeyGuard) -> Option<Option<V>> {
        let now = Instant::now();
        let clock = self.map.read().get(key).map(ValueSlot::clock);

        let live = match clock {
            Some(clock) if !clock.is_expired(now) => {
                // The key lock keeps the slot in place between the two reads
                self.map.read().get(key).map(|slot| {
                    slot.touch(now);
                    slot.value().cloned()
                })
            }
            _ => None,
        };

        match live {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        live
    }

    fn resolve_policy(&self, policy: Option<ExpirationPolicy>) -> Option<ExpirationPolicy> {
        policy.or_else(|| self.default_policy.as_ref().map(|factory| factory()))
    }

    fn store_computed_locked(
        &self,
        key: K,
        value: Option<V>,
        policy: Option<ExpirationPolicy>,
        guard: &KeyGuard,
    ) {
        if value.is_none() && !self.store_absent_values {
            return;
        }
        let policy = self.resolve_policy(policy).unwrap_or_default();
        self.store_slot_locked(key, ValueSlot::new(value, policy), guard);
    }

    fn store_slot_locked(&self, key: K, slot: ValueSlot<V>, _guard: &KeyGuard) {
        let can_expire = slot.can_expire();
        self.map.write().insert(key, slot);
        if can_expire {
            self.note_expirable_stored();
        }
    }

    fn remove_locked<F>(&self, key: &K, side_effect: Option<F>, guard: &KeyGuard) -> Result<bool>
    where
        F: FnOnce(),
    {
        if !self.map.read().contains_key(key) {
            return Ok(true);
        }
        if let Some(side_effect) = side_effect {
            side_effect();
        }

        match self.evict_locked(key, Removal::Explicit, guard)? {
            Eviction::Kept { .. } => Ok(false),
            _ => Ok(true),
        }
    }

    /// Removes a slot without notifying listeners.
    fn discard_locked(&self, key: &K, _guard: &KeyGuard) {
        let removed = self.map.write().remove(key);
        if let Some(slot) = removed {
            self.stats.record_removal();
            if self.dispose_values_on_removal {
                self.dispose(key, slot);
            }
        }
    }

    fn dispose(&self, key: &K, slot: ValueSlot<V>) {
        if let (Some(disposer), Some(value)) = (&self.disposer, slot.into_value()) {
            disposer(key, value);
        }
    }

    // == Sweeper State ==
    fn note_expirable_stored(&self) {
        let mut bookkeeping = self.bookkeeping.lock();
        bookkeeping.generation = bookkeeping.generation.wrapping_add(1);
        bookkeeping.has_expirable = true;

        if bookkeeping.sweeper.is_none() {
            match Sweeper::spawn(self.this.clone(), bookkeeping.interval) {
                Ok(sweeper) => bookkeeping.sweeper = Some(sweeper),
                // Retried on the next expirable store
                Err(err) => error!(error = %err, "Failed to start expiration sweeper"),
            }
        }
    }

    fn go_idle_unless_changed(&self, generation: u64) {
        let mut bookkeeping = self.bookkeeping.lock();
        if bookkeeping.generation != generation {
            return;
        }
        bookkeeping.has_expirable = false;
        if let Some(sweeper) = bookkeeping.sweeper.take() {
            sweeper.stop();
        }
    }

    // == Sweep ==
    fn sweep(&self) -> Result<SweepReport> {
        let generation = self.bookkeeping.lock().generation;
        let now = Instant::now();

        let mut report = SweepReport::default();
        let mut expirable_left = false;
        let clocks: Vec<(K, SlotClock)> = self
            .map
            .read()
            .iter()
            .map(|(key, slot)| (key.clone(), slot.clock()))
            .collect();
        report.scanned = clocks.len();

        let expired: Vec<K> = clocks
            .into_iter()
            .filter_map(|(key, clock)| {
                if clock.is_expired(now) {
                    Some(key)
                } else {
                    expirable_left |= clock.can_expire();
                    None
                }
            })
            .collect();
        report.expired = expired.len();

        for key in &expired {
            let guard = self.locks.acquire(key);
            match self.evict_locked(key, Removal::Expired, &guard)? {
                Eviction::Evicted => report.evicted += 1,
                Eviction::Kept { can_expire } => {
                    report.cancelled += 1;
                    expirable_left |= can_expire;
                }
                Eviction::Live { can_expire } => {
                    report.skipped += 1;
                    expirable_left |= can_expire;
                }
                Eviction::Missing => report.skipped += 1,
            }
        }

        if !expirable_left {
            self.go_idle_unless_changed(generation);
        }
        Ok(report)
    }

    /// Runs the eviction protocol for one key.
    ///
    /// The slot stays in the map until `expiring` has answered, so a failing
    /// or panicking listener leaves it untouched.
    fn evict_locked(&self, key: &K, cause: Removal, guard: &KeyGuard) -> Result<Eviction> {
        let current = self
            .map
            .read()
            .get(key)
            .map(|slot| (slot.value().cloned(), slot.clock()));
        let Some((value, clock)) = current else {
            return Ok(Eviction::Missing);
        };
        let can_expire = clock.can_expire();
        if cause == Removal::Expired && !clock.is_expired(Instant::now()) {
            return Ok(Eviction::Live { can_expire });
        }

        let listeners = self.listeners.read().clone();
        let response = raise_expiring(&listeners, key, value.as_ref(), &clock.policy)
            .map_err(CacheError::Notification)?;

        if response.cancel {
            let policy = match response.policy {
                Some(policy) => policy,
                None if can_expire => clock.policy,
                None => self.resolve_policy(None).unwrap_or(clock.policy),
            };
            let keeps_expiring = policy.can_expire();
            self.store_slot_locked(key.clone(), ValueSlot::new(value, policy), guard);
            self.stats.record_cancelled_eviction();
            debug!(can_expire = keeps_expiring, "Eviction cancelled by expiring handler");
            return Ok(Eviction::Kept {
                can_expire: keeps_expiring,
            });
        }

        let removed = self.map.write().remove(key);
        let Some(slot) = removed else {
            return Ok(Eviction::Missing);
        };
        match cause {
            Removal::Expired => self.stats.record_eviction(),
            Removal::Explicit => self.stats.record_removal(),
        }

        let dispose = raise_expired(&listeners, key, &slot, self.dispose_values_on_removal)
            .map_err(CacheError::Notification)?;
        if dispose {
            self.dispose(key, slot);
        }
        Ok(Eviction::Evicted)
    }
}

fn raise_expiring<K, V>(
    listeners: &[Listener<K, V>],
    key: &K,
    value: Option<&V>,
    policy: &ExpirationPolicy,
) -> std::result::Result<ExpiringResponse, BoxError> {
    let event = ExpiringEvent { key, value, policy };

    let mut combined = ExpiringResponse::proceed();
    for listener in listeners {
        let response = listener.on_expiring(&event)?;
        combined.cancel |= response.cancel;
        if response.policy.is_some() {
            combined.policy = response.policy;
        }
    }
    Ok(combined)
}

fn raise_expired<K, V>(
    listeners: &[Listener<K, V>],
    key: &K,
    slot: &ValueSlot<V>,
    dispose: bool,
) -> std::result::Result<bool, BoxError> {
    let mut dispose = dispose;
    for listener in listeners {
        let event = ExpiredEvent {
            key,
            value: slot.value(),
            dispose,
        };
        dispose = listener.on_expired(&event)?.dispose;
    }
    Ok(dispose)
}

impl<K, V, S> SweepTarget for Shared<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync + 'static,
{
    fn sweep_tick(&self) {
        // Key guards release on unwind and no slot leaves the map before
        // `expiring` has answered, so a panicking listener only ends the tick.
        match panic::catch_unwind(AssertUnwindSafe(|| self.sweep())) {
            Ok(Ok(report)) if report.evicted > 0 || report.cancelled > 0 => {
                info!(
                    "Expiration sweep: evicted {} entries, {} evictions cancelled",
                    report.evicted, report.cancelled
                );
            }
            Ok(Ok(_)) => debug!("Expiration sweep: no expired entries found"),
            Ok(Err(err)) => error!(error = %err, "Expiration sweep aborted"),
            Err(_) => error!("Expiration sweep aborted: an expiration listener panicked"),
        }
    }
}

impl<K, V, S> fmt::Debug for CacheStore<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bookkeeping = self.inner.bookkeeping.lock();
        f.debug_struct("CacheStore")
            .field("entries", &self.inner.map.read().len())
            .field("sweep_interval", &bookkeeping.interval)
            .field("sweeper_active", &bookkeeping.sweeper.is_some())
            .finish()
    }
}
