//! Integration Tests for the cache
//!
//! Exercises the public API across threads and tasks: single-flight
//! population, key isolation, background expiration and cancellable eviction.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use lazy_cache::{CacheStore, ExpirationPolicy, ExpiredResponse, ExpiringResponse};
use parking_lot::Mutex;

// == Helpers ==
fn fast_sweeping_cache() -> CacheStore<String, u32> {
    CacheStore::builder()
        .sweep_interval(Duration::from_millis(20))
        .build()
        .unwrap()
}

fn key(name: &str) -> String {
    name.to_string()
}

// == Scenarios ==
#[test]
fn test_add_get_overwrite_remove() {
    let cache: CacheStore<String, u32> = CacheStore::new();

    cache.add(key("a"), 1, ExpirationPolicy::Never, false);
    assert_eq!(cache.get(&key("a")), Some(1));

    cache.add(key("a"), 2, ExpirationPolicy::Never, true);
    assert_eq!(cache.get(&key("a")), Some(2));

    assert!(cache.remove(&key("a")).unwrap());
    assert_eq!(cache.get(&key("a")), None);
}

#[test]
fn test_fetch_twice_computes_once() {
    let cache: CacheStore<String, u32> = CacheStore::new();
    let calls = AtomicUsize::new(0);
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        Some(42)
    };

    assert_eq!(cache.get_or_fetch(key("x"), compute, ExpirationPolicy::Never, false), Some(42));
    assert_eq!(cache.get_or_fetch(key("x"), compute, ExpirationPolicy::Never, false), Some(42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// == Single Flight ==
#[test]
fn test_single_flight_across_threads() {
    let cache: CacheStore<String, u32> = CacheStore::new();
    let computes = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            let computes = computes.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_fetch(
                    key("k"),
                    || {
                        computes.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(50));
                        Some(7)
                    },
                    ExpirationPolicy::Never,
                    false,
                )
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(7));
    }
    assert_eq!(computes.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_across_tasks() {
    let cache: CacheStore<String, u32> = CacheStore::new();
    let computes = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let cache = cache.clone();
            let computes = computes.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch_async(
                        key("k"),
                        || async move {
                            computes.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Some(11)
                        },
                        None,
                        false,
                    )
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Some(11));
    }
    assert_eq!(computes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_compute_lets_next_caller_retry() {
    let cache: CacheStore<String, u32> = CacheStore::new();

    let first: Result<Option<u32>, String> =
        cache.try_get_or_fetch(key("k"), || Err("unavailable".to_string()), None, false);
    assert_eq!(first, Err("unavailable".to_string()));

    let second: Result<Option<u32>, String> =
        cache.try_get_or_fetch(key("k"), || Ok(Some(3)), None, false);
    assert_eq!(second, Ok(Some(3)));
}

#[test]
fn test_panicking_compute_releases_key() {
    let cache: CacheStore<String, u32> = CacheStore::new();

    let panicked = {
        let cache = cache.clone();
        thread::spawn(move || {
            cache.get_or_fetch(key("k"), || panic!("compute exploded"), None, false)
        })
        .join()
    };
    assert!(panicked.is_err());

    assert_eq!(cache.get_or_fetch(key("k"), || Some(5), None, false), Some(5));
}

// == Key Isolation ==
#[test]
fn test_slow_compute_does_not_block_other_keys() {
    let cache: CacheStore<String, u32> = CacheStore::new();
    let started = Arc::new(Barrier::new(2));
    let release = Arc::new(AtomicBool::new(false));

    let slow = {
        let cache = cache.clone();
        let started = started.clone();
        let release = release.clone();
        thread::spawn(move || {
            cache.get_or_fetch(
                key("a"),
                || {
                    started.wait();
                    while !release.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Some(1)
                },
                None,
                false,
            )
        })
    };

    started.wait();
    let begin = Instant::now();
    cache.add(key("b"), 2, None, false);
    assert_eq!(cache.get(&key("b")), Some(2));
    assert_eq!(cache.get_or_fetch(key("c"), || Some(3), None, false), Some(3));
    assert!(begin.elapsed() < Duration::from_millis(500));

    release.store(true, Ordering::SeqCst);
    assert_eq!(slow.join().unwrap(), Some(1));
    assert_eq!(cache.get(&key("a")), Some(1));
}

// == Expiration ==
#[test]
fn test_absolute_expiration_is_swept() {
    let cache = fast_sweeping_cache();
    let expired = Arc::new(Mutex::new(Vec::new()));
    let sink = expired.clone();
    cache.on_expired(move |event| {
        sink.lock().push(event.key.clone());
        Ok(ExpiredResponse {
            dispose: event.dispose,
        })
    });

    cache.add(key("a"), 1, ExpirationPolicy::Absolute(Duration::from_millis(100)), false);
    assert_eq!(cache.get(&key("a")), Some(1));
    assert!(cache.is_sweeper_active());

    thread::sleep(Duration::from_millis(300));

    assert_eq!(cache.get(&key("a")), None);
    assert!(!cache.contains(&key("a")), "entry must have been swept");
    assert_eq!(*expired.lock(), vec![key("a")]);
    assert!(!cache.is_sweeper_active(), "sweeper idles once nothing can expire");
}

#[test]
fn test_cancelled_eviction_survives_sweep() {
    let cache = fast_sweeping_cache();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    cache.on_expiring(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(ExpiringResponse::keep(Some(ExpirationPolicy::Never)))
    });

    cache.add(key("a"), 1, ExpirationPolicy::Absolute(Duration::from_millis(50)), false);
    thread::sleep(Duration::from_millis(250));

    assert_eq!(cache.get(&key("a")), Some(1));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn test_sweeper_restarts_after_idle() {
    let cache = fast_sweeping_cache();

    cache.add(key("a"), 1, ExpirationPolicy::Absolute(Duration::from_millis(30)), false);
    thread::sleep(Duration::from_millis(200));
    assert!(!cache.is_sweeper_active());

    cache.add(key("b"), 2, ExpirationPolicy::Absolute(Duration::from_millis(30)), false);
    assert!(cache.is_sweeper_active());
    thread::sleep(Duration::from_millis(200));

    assert!(!cache.contains(&key("b")));
    assert_eq!(cache.stats().evictions, 2);
}

#[test]
fn test_failing_listener_does_not_wedge_keys() {
    let cache = fast_sweeping_cache();
    cache.on_expiring(|event| {
        if event.key == "bad" {
            Err("cannot decide".into())
        } else {
            Ok(ExpiringResponse::proceed())
        }
    });

    cache.add(key("bad"), 1, ExpirationPolicy::Absolute(Duration::from_millis(10)), false);
    thread::sleep(Duration::from_millis(100));

    // The failing key is kept and its lock is free for callers
    assert!(cache.contains(&key("bad")));
    assert!(cache.remove(&key("bad")).unwrap_err().is_notification());
    assert!(cache.contains(&key("bad")));
}

#[test]
fn test_remove_notifies_listeners() {
    let cache: CacheStore<String, u32> = CacheStore::new();
    let expired = Arc::new(Mutex::new(Vec::new()));
    let sink = expired.clone();
    cache.on_expired(move |event| {
        sink.lock().push(event.key.clone());
        Ok(ExpiredResponse {
            dispose: event.dispose,
        })
    });

    cache.add(key("a"), 1, ExpirationPolicy::Never, false);
    assert!(cache.remove(&key("a")).unwrap());
    assert!(cache.remove(&key("missing")).unwrap());

    assert_eq!(*expired.lock(), vec![key("a")]);
}

// == Clear ==
#[test]
fn test_clear_under_concurrent_readers() {
    let cache: CacheStore<String, u32> = CacheStore::new();
    for i in 0..100 {
        cache.add(format!("k{}", i), i, ExpirationPolicy::Absolute(Duration::from_secs(60)), false);
    }

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    let _ = cache.get(&format!("k{}", i));
                }
            })
        })
        .collect();

    cache.clear();
    for reader in readers {
        reader.join().unwrap();
    }

    for i in 0..100 {
        assert!(!cache.contains(&format!("k{}", i)));
    }
    assert!(!cache.is_sweeper_active());
}

#[test]
fn test_dropping_last_handle_stops_sweeper() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticks_while_alive = {
        let cache = fast_sweeping_cache();
        let counter = ticks.clone();
        cache.on_expiring(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ExpiringResponse::keep(None))
        });
        cache.add(key("a"), 1, ExpirationPolicy::Absolute(Duration::from_millis(10)), false);
        thread::sleep(Duration::from_millis(100));
        ticks.load(Ordering::SeqCst)
    };
    assert!(ticks_while_alive >= 1);

    thread::sleep(Duration::from_millis(60));
    let after_drop = ticks.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
}
