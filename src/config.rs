//! Configuration Module
//!
//! Handles loading the store-level cache options from environment variables.

use std::env;
use std::time::Duration;

/// Default interval between two expiration sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Store-level cache options.
///
/// The default expiration policy factory, the key hasher and listeners are not
/// representable as plain values and are set on the builder instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Interval between two background expiration sweeps
    pub sweep_interval: Duration,
    /// Whether an absent (`None`) computed value is stored
    pub store_absent_values: bool,
    /// Whether removed or evicted values are handed to the disposer
    pub dispose_values_on_removal: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SWEEP_INTERVAL_MS` - Sweep interval in milliseconds (default: 1000)
    /// - `STORE_ABSENT_VALUES` - Store `None` results (default: false)
    /// - `DISPOSE_VALUES_ON_REMOVAL` - Dispose removed values (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            sweep_interval: env::var("SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.sweep_interval),
            store_absent_values: env::var("STORE_ABSENT_VALUES")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.store_absent_values),
            dispose_values_on_removal: env::var("DISPOSE_VALUES_ON_REMOVAL")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.dispose_values_on_removal),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            store_absent_values: false,
            dispose_values_on_removal: false,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert!(!config.store_absent_values);
        assert!(!config.dispose_values_on_removal);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the env so parallel tests don't race on it
        env::remove_var("SWEEP_INTERVAL_MS");
        env::remove_var("STORE_ABSENT_VALUES");
        env::remove_var("DISPOSE_VALUES_ON_REMOVAL");
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        env::set_var("SWEEP_INTERVAL_MS", "250");
        env::set_var("STORE_ABSENT_VALUES", "yes");
        env::set_var("DISPOSE_VALUES_ON_REMOVAL", "TRUE");
        let config = CacheConfig::from_env();
        assert_eq!(config.sweep_interval, Duration::from_millis(250));
        assert!(config.store_absent_values);
        assert!(config.dispose_values_on_removal);

        // Zero and garbage fall back to defaults
        env::set_var("SWEEP_INTERVAL_MS", "0");
        env::set_var("STORE_ABSENT_VALUES", "maybe");
        let config = CacheConfig::from_env();
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert!(!config.store_absent_values);

        env::remove_var("SWEEP_INTERVAL_MS");
        env::remove_var("STORE_ABSENT_VALUES");
        env::remove_var("DISPOSE_VALUES_ON_REMOVAL");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), None);
    }
}
