//! Cache Builder Module
//!
//! Collects store-level options before constructing a [`CacheStore`].

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::store::{Disposer, PolicyFactory, StoreOptions};
use crate::cache::{CacheStore, ExpirationListener, ExpirationPolicy};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Builder for configuring and constructing a [`CacheStore`].
///
/// # Example
/// ```
/// use lazy_cache::{CacheBuilder, CacheStore, ExpirationPolicy};
/// use std::time::Duration;
///
/// let cache: CacheStore<String, String> = CacheBuilder::new()
///     .sweep_interval(Duration::from_millis(250))
///     .default_policy(|| ExpirationPolicy::Sliding(Duration::from_secs(30)))
///     .build()
///     .unwrap();
/// ```
pub struct CacheBuilder<K, V, S = RandomState> {
    config: CacheConfig,
    hasher: S,
    default_policy: Option<PolicyFactory>,
    disposer: Option<Disposer<K, V>>,
    listeners: Vec<Arc<dyn ExpirationListener<K, V>>>,
    _marker: PhantomData<fn(K, V)>,
}

impl<K, V> CacheBuilder<K, V, RandomState> {
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            hasher: RandomState::new(),
            default_policy: None,
            disposer: None,
            listeners: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<K, V> Default for CacheBuilder<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> CacheBuilder<K, V, S> {
    /// Replaces every plain option with the values in `config`.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Interval between two background sweeps (default: 1 second).
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Store `None` results of `compute` instead of only returning them.
    pub fn store_absent_values(mut self, enabled: bool) -> Self {
        self.config.store_absent_values = enabled;
        self
    }

    /// Hand removed and evicted values to the disposer by default.
    pub fn dispose_values_on_removal(mut self, enabled: bool) -> Self {
        self.config.dispose_values_on_removal = enabled;
        self
    }

    /// Policy used whenever a value is stored without an explicit one.
    pub fn default_policy<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> ExpirationPolicy + Send + Sync + 'static,
    {
        self.default_policy = Some(Arc::new(factory));
        self
    }

    /// Releases the resources of a removed value when disposal is requested.
    ///
    /// Without a disposer, a disposed value is simply dropped.
    pub fn disposer<F>(mut self, disposer: F) -> Self
    where
        F: Fn(&K, V) + Send + Sync + 'static,
    {
        self.disposer = Some(Arc::new(disposer));
        self
    }

    /// Registers an expiration listener.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: ExpirationListener<K, V> + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Sets the hasher defining key identity for both storage and locking.
    pub fn hasher<S2>(self, hasher: S2) -> CacheBuilder<K, V, S2> {
        CacheBuilder {
            config: self.config,
            hasher,
            default_policy: self.default_policy,
            disposer: self.disposer,
            listeners: self.listeners,
            _marker: PhantomData,
        }
    }
}

impl<K, V, S> CacheBuilder<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync + 'static,
{
    // == Build ==
    /// Constructs the cache.
    ///
    /// # Errors
    /// `InvalidArgument` if the sweep interval is zero.
    pub fn build(self) -> Result<CacheStore<K, V, S>> {
        if self.config.sweep_interval.is_zero() {
            return Err(CacheError::InvalidArgument(
                "sweep interval must be greater than zero".to_string(),
            ));
        }

        Ok(CacheStore::from_options(
            self.hasher,
            StoreOptions {
                config: self.config,
                default_policy: self.default_policy,
                disposer: self.disposer,
                listeners: self.listeners,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::BuildHasherDefault;

    #[test]
    fn test_build_rejects_zero_interval() {
        let result: Result<CacheStore<u32, u32>> = CacheBuilder::new()
            .sweep_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_build_applies_config() {
        let config = CacheConfig {
            sweep_interval: Duration::from_millis(300),
            store_absent_values: true,
            dispose_values_on_removal: false,
        };
        let cache: CacheStore<u32, u32> = CacheBuilder::new().config(config).build().unwrap();

        assert_eq!(cache.sweep_interval(), Duration::from_millis(300));
        cache.get_or_fetch(1, || None, None, false);
        assert!(cache.contains(&1));
    }

    #[test]
    fn test_custom_hasher() {
        let cache: CacheStore<u32, &'static str, BuildHasherDefault<DefaultHasher>> =
            CacheBuilder::new()
                .hasher(BuildHasherDefault::<DefaultHasher>::default())
                .build()
                .unwrap();

        cache.add(1, "one", None, false);
        assert_eq!(cache.get(&1), Some("one"));
        assert_eq!(cache.key_lock_count(), 1);
    }

    #[test]
    fn test_from_config() {
        let cache = CacheStore::<u32, u32>::from_config(&CacheConfig::default()).unwrap();
        assert_eq!(cache.sweep_interval(), Duration::from_secs(1));
    }
}
