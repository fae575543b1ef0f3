//! Tests for the windowed strategy.

use super::*;
use crate::strategy::Strategy;
use crate::testing::{CountingResolver, RecordingLogger};
use async_trait::async_trait;
use futures::future::join_all;
use rsloader_domain::{BatchFunction, CancellationToken, Keys, LoadError, ResultMap};
use std::sync::Arc;
use std::time::Duration;

fn window(capacity: usize, resolver: Arc<CountingResolver>) -> StandardStrategy<u64, String> {
    // Generous timeout so count-triggered tests never race the deadline
    let options = StandardOptions::default().with_timeout(Duration::from_secs(5));
    StandardStrategy::<u64, String>::new(capacity, resolver, options)
}

fn sorted(mut keys: Vec<u64>) -> Vec<u64> {
    keys.sort_unstable();
    keys
}

// ============================================================
// Section 1: Window closing by capacity
// ============================================================

#[tokio::test]
async fn test_two_loads_and_noop_make_one_call() {
    let resolver = Arc::new(CountingResolver::new("capacity"));
    let strategy = window(3, resolver.clone());
    let ctx = CancellationToken::new();

    let first = strategy.load(&ctx, 1).await;
    let second = strategy.load(&ctx, 2).await;
    strategy.load_noop(&ctx).await;

    // Loads only enqueue. The test runtime is single-threaded, so the worker
    // has not been polled yet and nothing is resolved until the first read.
    assert_eq!(resolver.calls(), 0);
    assert_eq!(strategy.status(), WorkerStatus::Running);

    let (one, found_one) = first.get().await;
    let (two, found_two) = second.get().await;

    assert!(found_one && found_two);
    assert_eq!(one.value, Some(resolver.expected(1)));
    assert_eq!(two.value, Some(resolver.expected(2)));
    assert_eq!(resolver.calls(), 1);
    assert_eq!(sorted(resolver.batches()[0].clone()), vec![1, 2]);
    assert_eq!(strategy.status(), WorkerStatus::Ran);
}

#[tokio::test]
async fn test_loads_and_load_many_share_one_call() {
    let resolver = Arc::new(CountingResolver::new("mixed"));
    let strategy = window(3, resolver.clone());
    let ctx = CancellationToken::new();

    let first = strategy.load(&ctx, 1).await;
    let second = strategy.load(&ctx, 2).await;
    let many = strategy.load_many(&ctx, vec![3]).await;

    assert_eq!(first.get().await.0.value, Some(resolver.expected(1)));
    assert_eq!(second.get().await.0.value, Some(resolver.expected(2)));

    let results = many.get().await;
    let (three, found) = results.get_value(&3u64);
    assert!(found);
    assert_eq!(three.value, Some(resolver.expected(3)));
    assert_eq!(results.len(), 1);

    assert_eq!(resolver.calls(), 1);
    assert_eq!(sorted(resolver.batches()[0].clone()), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_duplicate_keys_reach_resolver_once() {
    let resolver = Arc::new(CountingResolver::new("dedup"));
    let strategy = window(3, resolver.clone());
    let ctx = CancellationToken::new();

    let a = strategy.load(&ctx, 1).await;
    let b = strategy.load(&ctx, 1).await;
    let many = strategy.load_many(&ctx, vec![1, 2, 2]).await;

    assert_eq!(a.get().await, b.get().await);
    assert_eq!(many.get().await.len(), 2);
    assert_eq!(resolver.calls(), 1);
    assert_eq!(sorted(resolver.batches()[0].clone()), vec![1, 2]);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_window() {
    let resolver = Arc::new(CountingResolver::new("concurrent"));
    let strategy = Arc::new(window(5, resolver.clone()));
    let ctx = CancellationToken::new();

    let handles: Vec<_> = (0..5u64)
        .map(|i| {
            let strategy = Arc::clone(&strategy);
            let ctx = ctx.clone();
            // Keys 0..5 with one repeat
            let key = i.min(3);
            tokio::spawn(async move { (key, strategy.load(&ctx, key).await.get().await) })
        })
        .collect();

    let results = join_all(handles).await;
    for result in results {
        let (key, (value, found)) = result.unwrap();
        assert!(found);
        assert_eq!(value.value, Some(resolver.expected(key)));
    }

    assert_eq!(resolver.calls(), 1);
    assert_eq!(sorted(resolver.batches()[0].clone()), vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_thunk_reads_are_memoized() {
    let resolver = Arc::new(CountingResolver::new("memo"));
    let strategy = window(1, resolver.clone());
    let ctx = CancellationToken::new();

    let thunk = strategy.load(&ctx, 9).await;
    let first = thunk.get().await;
    let second = thunk.clone().get().await;

    assert_eq!(first, second);
    assert!(thunk.is_ready());
    assert_eq!(resolver.calls(), 1);
}

// ============================================================
// Section 2: Window closing by timeout
// ============================================================

#[tokio::test]
async fn test_timeout_closes_partial_window_then_late_key_falls_back() {
    let resolver = Arc::new(CountingResolver::new("timeout"));
    let options = StandardOptions::default().with_timeout(Duration::from_millis(20));
    let strategy = StandardStrategy::<u64, String>::new(3, resolver.clone(), options);
    let ctx = CancellationToken::new();

    let early = strategy.load(&ctx, 1).await;
    let (result, found) = early.get().await;
    assert!(found);
    assert_eq!(result.value, Some(resolver.expected(1)));
    assert_eq!(resolver.batches(), vec![vec![1]]);

    // The window is closed; this key is resolved on its own
    let late = strategy.load(&ctx, 2).await;
    let (result, found) = late.get().await;
    assert!(found);
    assert_eq!(result.value, Some(resolver.expected(2)));
    assert_eq!(resolver.calls(), 2);
    assert_eq!(resolver.batches(), vec![vec![1], vec![2]]);
}

#[tokio::test]
async fn test_zero_capacity_closes_on_timeout_only() {
    let resolver = Arc::new(CountingResolver::new("zero"));
    let options = StandardOptions::default().with_timeout(Duration::from_millis(20));
    let strategy = StandardStrategy::<u64, String>::new(0, resolver.clone(), options);
    let ctx = CancellationToken::new();

    let first = strategy.load(&ctx, 1).await;
    let second = strategy.load(&ctx, 2).await;
    let third = strategy.load(&ctx, 3).await;

    assert!(first.get().await.1);
    assert!(second.get().await.1);
    assert!(third.get().await.1);
    assert_eq!(resolver.calls(), 1);
    assert_eq!(sorted(resolver.batches()[0].clone()), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_noop_only_window_resolves_empty_key_set() {
    let resolver = Arc::new(CountingResolver::new("empty"));
    let options = StandardOptions::default().with_timeout(Duration::from_millis(10));
    let strategy = StandardStrategy::<u64, String>::new(3, resolver.clone(), options);

    strategy.load_noop(&CancellationToken::new()).await;

    let deadline = tokio::time::timeout(Duration::from_secs(2), async {
        while strategy.status() != WorkerStatus::Ran {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(deadline.is_ok(), "window should close on its timeout");
    assert_eq!(resolver.batches(), vec![Vec::<u64>::new()]);
}

#[tokio::test]
async fn test_zero_timeout_field_selects_default() {
    let resolver = Arc::new(CountingResolver::new("zero_field"));
    let mut options = StandardOptions::default();
    options.timeout = Duration::ZERO;

    let strategy = StandardStrategy::<u64, String>::new(2, resolver.clone(), options);
    assert_eq!(strategy.timeout(), DEFAULT_TIMEOUT);

    let ctx = CancellationToken::new();
    let first = strategy.load(&ctx, 1).await;
    let second = strategy.load(&ctx, 2).await;
    assert!(first.get().await.1);
    assert!(second.get().await.1);
    assert_eq!(resolver.calls(), 1);
}

#[test]
fn test_zero_timeout_selects_default() {
    let options = StandardOptions::default().with_timeout(Duration::ZERO);
    assert_eq!(options.timeout, DEFAULT_TIMEOUT);

    let options = StandardOptions::default().with_timeout(Duration::from_millis(40));
    assert_eq!(options.timeout, Duration::from_millis(40));
}

// ============================================================
// Section 3: Missing and absent keys
// ============================================================

#[tokio::test]
async fn test_missing_key_skips_fallback_but_absent_key_uses_it() {
    let resolver = Arc::new(
        CountingResolver::new("keys")
            .with_missing([2])
            .with_skipped([3]),
    );
    let strategy = window(3, resolver.clone());
    let ctx = CancellationToken::new();

    let resolved = strategy.load(&ctx, 1).await;
    let missing = strategy.load(&ctx, 2).await;
    let absent = strategy.load(&ctx, 3).await;

    let (result, found) = resolved.get().await;
    assert!(found);
    assert_eq!(result.value, Some(resolver.expected(1)));

    let (result, found) = missing.get().await;
    assert!(!found);
    assert!(result.value.is_none() && result.error.is_none());
    assert_eq!(resolver.calls(), 1, "missing keys are final");

    // The fallback runs but the resolver still omits the key
    let (result, found) = absent.get().await;
    assert!(!found);
    assert!(result.value.is_none());
    assert_eq!(resolver.calls(), 2);
    assert_eq!(resolver.batches()[1], vec![3]);
}

#[tokio::test]
async fn test_per_key_error_is_returned_not_retried() {
    let resolver = Arc::new(CountingResolver::new("errors").with_failing([1]));
    let strategy = window(1, resolver.clone());
    let ctx = CancellationToken::new();

    let (result, found) = strategy.load(&ctx, 1).await.get().await;

    assert!(found);
    assert!(matches!(result.error, Some(LoadError::Resolver { .. })));
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_load_many_supplements_absent_keys_in_one_call() {
    let resolver = Arc::new(
        CountingResolver::new("many")
            .with_missing([2])
            .with_skipped([3, 4]),
    );
    let strategy = window(1, resolver.clone());
    let ctx = CancellationToken::new();

    let results = strategy.load_many(&ctx, vec![1, 2, 3, 4]).await.get().await;

    assert!(results.get_value(&1u64).1);
    // Missing keys are absent from the returned map and not retried
    assert!(!results.contains(&2u64));
    assert!(!results.contains(&3u64));
    assert_eq!(resolver.calls(), 2);
    assert_eq!(sorted(resolver.batches()[1].clone()), vec![3, 4]);
}

#[tokio::test]
async fn test_supplemental_call_fills_late_load_many() {
    let resolver = Arc::new(CountingResolver::new("late_many"));
    let strategy = window(1, resolver.clone());
    let ctx = CancellationToken::new();

    strategy.load(&ctx, 1).await.get().await;
    let results = strategy.load_many(&ctx, vec![5, 6]).await.get().await;

    assert_eq!(results.get_value(&5u64).0.value, Some(resolver.expected(5)));
    assert_eq!(results.get_value(&6u64).0.value, Some(resolver.expected(6)));
    assert_eq!(resolver.calls(), 2);
}

// ============================================================
// Section 4: Cancellation and failure
// ============================================================

#[tokio::test]
async fn test_cancelled_window_never_calls_resolver() {
    let resolver = Arc::new(CountingResolver::new("cancelled"));
    let logger = Arc::new(RecordingLogger::default());
    let options = StandardOptions::default().with_logger(logger.clone());
    let strategy = StandardStrategy::<u64, String>::new(3, resolver.clone(), options);

    let ctx = CancellationToken::new();
    ctx.cancel();

    let single = strategy.load(&ctx, 1).await;
    let many = strategy.load_many(&ctx, vec![2, 3]).await;

    let (result, found) = single.get().await;
    assert!(!found);
    assert!(result.value.is_none());
    assert!(many.get().await.is_empty());

    assert_eq!(resolver.calls(), 0);
    assert_eq!(logger.messages().last().map(String::as_str), Some("worker cancelled"));
    assert_eq!(strategy.status(), WorkerStatus::Ran);
}

#[tokio::test]
async fn test_cancellation_during_window_releases_waiters() {
    let resolver = Arc::new(CountingResolver::new("mid_cancel"));
    let logger = Arc::new(RecordingLogger::default());
    let options = StandardOptions::default()
        .with_timeout(Duration::from_secs(5))
        .with_logger(logger.clone());
    let strategy = StandardStrategy::<u64, String>::new(10, resolver.clone(), options);
    let ctx = CancellationToken::new();

    let thunk = strategy.load(&ctx, 1).await;
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(2), thunk.get()).await;
    let (_, found) = outcome.expect("cancellation should release the waiter");
    assert!(!found);
    assert_eq!(resolver.calls(), 0);
    assert_eq!(logger.messages(), vec!["worker cancelled".to_string()]);
}

#[tokio::test]
async fn test_cancelled_caller_skips_fallback() {
    let resolver = Arc::new(CountingResolver::new("late_cancel"));
    let strategy = window(1, resolver.clone());

    strategy.load(&CancellationToken::new(), 1).await.get().await;

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let (result, found) = strategy.load(&cancelled, 2).await.get().await;

    assert!(!found);
    assert!(result.value.is_none());
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_worker_panic_surfaces_task_failure() {
    struct PanickingResolver;

    #[async_trait]
    impl BatchFunction<u64, String> for PanickingResolver {
        async fn load(&self, _ctx: &CancellationToken, _keys: &Keys<u64>) -> ResultMap<String> {
            panic!("backend exploded");
        }
    }

    let strategy: StandardStrategy<u64, String> =
        StandardStrategy::<u64, String>::new(2, Arc::new(PanickingResolver), StandardOptions::default());
    let ctx = CancellationToken::new();

    let single = strategy.load(&ctx, 1).await;
    let many = strategy.load_many(&ctx, vec![2]).await;

    let (result, found) = single.get().await;
    assert!(found);
    assert!(matches!(result.error, Some(LoadError::TaskFailed { .. })));

    let results = many.get().await;
    assert!(matches!(
        results.get_value(&2u64).0.error,
        Some(LoadError::TaskFailed { .. })
    ));
    assert_eq!(strategy.status(), WorkerStatus::Ran);
}

// ============================================================
// Section 5: Factory
// ============================================================

#[tokio::test]
async fn test_factory_builds_independent_windows() {
    let resolver = Arc::new(CountingResolver::new("factory"));
    let factory = StandardStrategy::<u64, String>::factory(
        StandardOptions::default().with_timeout(Duration::from_secs(5)),
    );
    let ctx = CancellationToken::new();

    for key in [1u64, 2] {
        let strategy = factory(1, resolver.clone());
        let (result, found) = strategy.load(&ctx, key).await.get().await;
        assert!(found);
        assert_eq!(result.value, Some(resolver.expected(key)));
    }

    assert_eq!(resolver.batches(), vec![vec![1], vec![2]]);
}
