mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use keepwarm::{
    BackoffDelay, BackoffPolicy, BackoffSource, Cache, CacheError, EventKind, RefreshError,
    RefreshFn, RefresherRef,
};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use common::{PERIOD, cache_with, count, counting, drain, ms};

#[tokio::test(start_paused = true)]
async fn initial_load_computes_once() {
    let lifetime = CancellationToken::new();
    let (refresher, calls) = counting(PERIOD, 0);
    let cache = cache_with(&lifetime, refresher);

    let v = cache.get(&CancellationToken::new(), "foo").await;
    assert_eq!(v, Ok(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(cache.contains_key(&"foo"));
    assert_eq!(cache.len(), 1);

    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn concurrent_gets_share_one_computation() {
    let lifetime = CancellationToken::new();
    let (refresher, calls) = counting(PERIOD, 0);
    let cache = cache_with(&lifetime, refresher);

    let mut waiters = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        waiters.push(tokio::spawn(async move {
            cache.get(&CancellationToken::new(), "foo").await
        }));
    }
    for w in waiters {
        assert_eq!(w.await.unwrap(), Ok(1));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn distinct_keys_get_distinct_actors() {
    let lifetime = CancellationToken::new();
    let (refresher, calls) = counting(PERIOD, 0);
    let cache = cache_with(&lifetime, refresher);

    let req = CancellationToken::new();
    let (a, b) = tokio::join!(cache.get(&req, "a"), cache.get(&req, "b"));
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let mut keys = cache.keys();
    keys.sort_unstable();
    assert_eq!(keys, vec!["a", "b"]);
    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn hot_key_is_refreshed_in_background() {
    let lifetime = CancellationToken::new();
    let (refresher, _calls) = counting(PERIOD, 0);
    let cache = cache_with(&lifetime, refresher);
    let req = CancellationToken::new();

    // Initial value is ready one PERIOD in; the first check is 2 PERIODs later.
    assert_eq!(cache.get(&req, "foo").await, Ok(1));

    time::sleep(PERIOD).await;
    assert_eq!(cache.get(&req, "foo").await, Ok(1));

    // Check fires, refresh takes one PERIOD, result is adopted.
    time::sleep(PERIOD * 3).await;
    assert_eq!(cache.get(&req, "foo").await, Ok(2));

    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn refresh_count_tracks_elapsed_intervals() {
    let lifetime = CancellationToken::new();
    let (refresher, calls) = counting(ms(0), 0);
    let cache = cache_with(&lifetime, refresher);
    let req = CancellationToken::new();
    let interval = PERIOD * 2;

    let start = Instant::now();
    assert_eq!(cache.get(&req, "foo").await, Ok(1));

    // Read half-way through each interval: k elapsed intervals, k refreshes.
    for k in 0..6u32 {
        time::sleep_until(start + interval / 2 + interval * k).await;
        let expected = k as usize + 1;
        assert_eq!(cache.get(&req, "foo").await, Ok(expected));
        assert_eq!(calls.load(Ordering::SeqCst), expected);
    }

    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn unused_key_is_evicted() {
    let lifetime = CancellationToken::new();
    let (refresher, _calls) = counting(PERIOD, 0);
    let cache = cache_with(&lifetime, refresher);
    let req = CancellationToken::new();

    assert_eq!(cache.get(&req, "foo").await, Ok(1));
    time::sleep(PERIOD / 2).await;

    // Offsets in PERIODs after the first value:
    // 0.5, 1.5  cached
    // 2.0       check: used, refresh starts
    // 2.5       refreshing, cached
    // 3.0       refreshed, next check at 5.0
    // 3.5, 4.5  cached
    // 5.0       check: unused, evicted
    // 5.5, 6.5  gone
    for i in 0..7 {
        assert_eq!(cache.contains_key(&"foo"), i < 5, "offset {i}.5");
        time::sleep(PERIOD).await;
    }

    // A fresh actor starts over with a new initial computation.
    assert_eq!(cache.get(&req, "foo").await, Ok(3));
    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_serves_stale_value_without_blocking() {
    let lifetime = CancellationToken::new();
    let (refresher, calls) = counting(PERIOD * 3, 0);
    let cache = cache_with(&lifetime, refresher);
    let mut events = cache.events();
    let req = CancellationToken::new();

    assert_eq!(cache.get(&req, "foo").await, Ok(1));
    time::sleep(PERIOD / 2).await;

    // Offsets in PERIODs after the first value:
    // 2.0  check: refresh starts (takes 3 PERIODs)
    // 4.0  check: still refreshing, overrun reported, no second refresh
    // 5.0  refresh lands, v = 2
    for i in 0..6 {
        let before = Instant::now();
        let v = cache.get(&req, "foo").await;
        assert_eq!(Instant::now(), before, "get blocked at offset {i}.5");
        assert_eq!(v, Ok(1 + i / 5), "offset {i}.5");
        time::sleep(PERIOD).await;
    }
    assert_eq!(cache.get(&req, "foo").await, Ok(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let seen = drain(&mut events);
    assert_eq!(count(&seen, EventKind::RefreshOverrun), 1);
    assert_eq!(count(&seen, EventKind::RefreshStarted), 1);
    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn failures_are_cached_until_a_later_success() {
    let lifetime = CancellationToken::new();
    let (refresher, calls) = counting(PERIOD, 2);
    let cache = cache_with(&lifetime, refresher);
    let req = CancellationToken::new();
    let failed = Err(CacheError::Refresh(RefreshError::fail("an error")));

    assert_eq!(cache.get(&req, "foo").await, failed);

    time::sleep(PERIOD / 2).await;
    assert_eq!(cache.get(&req, "foo").await, failed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // 1.0: second attempt fails, next check backs off to 5.0 and finds the
    // key unused; the read at 7.5 starts a fresh actor whose attempt succeeds.
    time::sleep(PERIOD * 7).await;
    assert_eq!(cache.get(&req, "foo").await, Ok(3));

    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn success_resets_negative_backoff() {
    let lifetime = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    // Calls 1, 2 and 4 fail.
    let refresher: RefresherRef<&'static str, usize> =
        RefreshFn::arc(move |_ctx: CancellationToken, _key: &'static str| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                match n {
                    1 | 2 | 4 => Err(RefreshError::fail("flaky")),
                    n => Ok(n),
                }
            }
        });
    let cache: Cache<&'static str, usize> = Cache::new(
        lifetime.clone(),
        refresher,
        Arc::new(BackoffDelay::constant(ms(1_000))),
        Arc::new(BackoffDelay::new(BackoffPolicy::exponential(
            ms(100),
            2.0,
            ms(10_000),
        ))),
    );
    let mut events = cache.events();
    let req = CancellationToken::new();
    let start = Instant::now();

    // Checks at 100 (fail), 500 (ok), 1500 (fail); reads keep the key hot.
    assert!(cache.get(&req, "k").await.is_err());
    for k in 0..32u64 {
        time::sleep_until(start + ms(25 + 50 * k)).await;
        let at = 25 + 50 * k;
        let v = cache.get(&req, "k").await;
        match at {
            0..=499 => assert!(v.is_err(), "at {at}ms: {v:?}"),
            500..=1499 => assert_eq!(v, Ok(3), "at {at}ms"),
            _ => assert!(v.is_err(), "at {at}ms: {v:?}"),
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let scheduled: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|e| e.kind == EventKind::RefreshScheduled)
        .collect();
    let delays = |source: BackoffSource| -> Vec<u32> {
        scheduled
            .iter()
            .filter(|e| e.backoff_source == Some(source))
            .filter_map(|e| e.delay_ms)
            .collect()
    };
    assert_eq!(delays(BackoffSource::Failure), vec![100, 200, 400, 800, 100]);
    assert_eq!(delays(BackoffSource::Success), vec![1_000, 1_000]);

    lifetime.cancel();
}

#[tokio::test(start_paused = true)]
async fn panicking_refresher_is_negatively_cached() {
    let lifetime = CancellationToken::new();
    let refresher: RefresherRef<u32, u32> =
        RefreshFn::arc(|_ctx: CancellationToken, key: u32| async move {
            if key == 0 {
                panic!("kaboom");
            }
            Ok::<u32, RefreshError>(key)
        });
    let cache = Cache::new(
        lifetime.clone(),
        refresher,
        Arc::new(BackoffDelay::constant(ms(500))),
        Arc::new(BackoffDelay::constant(ms(500))),
    );
    let req = CancellationToken::new();

    let err = cache.get(&req, 0).await.unwrap_err();
    assert_eq!(
        err.as_refresh(),
        Some(&RefreshError::Panicked {
            reason: "kaboom".into()
        })
    );
    // The actor survived and keeps serving the cached error.
    assert!(cache.contains_key(&0));
    assert_eq!(cache.get(&req, 0).await, Err(err));
    assert_eq!(cache.get(&req, 7).await, Ok(7));

    lifetime.cancel();
}
