//! Lazy Cache demo
//!
//! Exercises the cache the way a host application would: concurrent lookups
//! collapse into one computation per key, entries expire, and the sweeper
//! reports evictions until the process is interrupted.

use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lazy_cache::{
    BoxError, CacheConfig, CacheStore, ExpirationListener, ExpirationPolicy, ExpiredEvent,
    ExpiredResponse, ExpiringEvent, ExpiringResponse,
};

/// Number of concurrent lookups issued at startup.
const DEMO_LOOKUPS: usize = 12;

/// Number of distinct keys those lookups share.
const DEMO_KEYS: usize = 4;

/// Logs every expiration; keeps `config:*` entries alive for another round.
struct LoggingListener;

impl ExpirationListener<String, String> for LoggingListener {
    fn on_expiring(
        &self,
        event: &ExpiringEvent<'_, String, String>,
    ) -> Result<ExpiringResponse, BoxError> {
        if event.key.starts_with("config:") {
            info!(key = %event.key, "Keeping configuration entry");
            return Ok(ExpiringResponse::keep(Some(ExpirationPolicy::Never)));
        }
        Ok(ExpiringResponse::proceed())
    }

    fn on_expired(
        &self,
        event: &ExpiredEvent<'_, String, String>,
    ) -> Result<ExpiredResponse, BoxError> {
        info!(key = %event.key, dispose = event.dispose, "Entry expired");
        Ok(ExpiredResponse {
            dispose: event.dispose,
        })
    }
}

/// Main entry point for the cache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache with a logging listener
/// 4. Issue concurrent lookups sharing a few keys
/// 5. Report statistics every sweep interval until Ctrl+C/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazy_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lazy Cache demo");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: sweep_interval={:?}, store_absent_values={}, dispose_values_on_removal={}",
        config.sweep_interval, config.store_absent_values, config.dispose_values_on_removal
    );

    let cache: CacheStore<String, String> = CacheStore::builder()
        .config(config.clone())
        .default_policy(|| ExpirationPolicy::Sliding(Duration::from_secs(5)))
        .listener(LoggingListener)
        .disposer(|key: &String, _value| info!(key = %key, "Value disposed"))
        .build()
        .context("invalid cache configuration")?;

    let lookups: Vec<_> = (0..DEMO_LOOKUPS)
        .map(|i| {
            let cache = cache.clone();
            let key = format!("user:{}", i % DEMO_KEYS);
            tokio::spawn(async move {
                cache
                    .get_or_fetch_async(
                        key.clone(),
                        || slow_lookup(key),
                        ExpirationPolicy::Absolute(Duration::from_secs(3)),
                        false,
                    )
                    .await
            })
        })
        .collect();
    for lookup in lookups {
        lookup.await.context("lookup task failed")?;
    }
    cache.add(
        "config:region".to_string(),
        "eu-west".to_string(),
        ExpirationPolicy::Absolute(Duration::from_secs(2)),
        false,
    );
    cache.add("session:demo".to_string(), "active".to_string(), None, false);

    info!(
        "Cache warmed: {} entries, {} computations",
        cache.len(),
        cache.stats().computes
    );

    let mut ticker = tokio::time::interval(config.sweep_interval);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stats = serde_json::to_string(&cache.stats())?;
                info!("Stats: {}", stats);
            }
            _ = &mut shutdown => break,
        }
    }

    cache.clear();
    info!("Cache cleared, demo complete");
    Ok(())
}

/// Stands in for an expensive backend call.
async fn slow_lookup(key: String) -> Option<String> {
    tokio::time::sleep(Duration::from_millis(200)).await;
    Some(format!("profile of {}", key))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
