//! Dispatch middleware behavior tests.
//!
//! These exercise the caching, retry, and pass-through contracts of
//! `Dispatcher::execute` with counting fakes instead of real network calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

use jobticket_client::dispatch::{ApiRequest, Dispatcher, Policy};

/// A call that counts invocations and always resolves with `value`.
fn resolving(
    calls: &Arc<AtomicUsize>,
    value: serde_json::Value,
) -> impl Fn(ApiRequest) -> std::pin::Pin<Box<dyn Future<Output = Result<serde_json::Value, String>> + Send>>
{
    let calls = Arc::clone(calls);
    move |_req| {
        let calls = Arc::clone(&calls);
        let value = value.clone();
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        })
    }
}

/// A call that counts invocations and always rejects with `error`.
fn rejecting(
    calls: &Arc<AtomicUsize>,
    error: &str,
) -> impl Fn(ApiRequest) -> std::pin::Pin<Box<dyn Future<Output = Result<serde_json::Value, String>> + Send>>
{
    let calls = Arc::clone(calls);
    let error = error.to_string();
    move |_req| {
        let calls = Arc::clone(&calls);
        let error = error.clone();
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(error)
        })
    }
}

fn caching_policy(ttl: Duration) -> Policy {
    Policy { enable_caching: true, cache_duration: ttl, enable_logging: false, ..Policy::default() }
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn test_cache_hit_skips_second_call() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_secs(5)));
    let calls = Arc::new(AtomicUsize::new(0));
    let call = resolving(&calls, json!({"id": 1, "name": "A"}));

    let first = dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();
    let second = dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cache_expiry_refetches() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_millis(60)));
    let calls = Arc::new(AtomicUsize::new(0));
    let call = resolving(&calls, json!({"id": 1}));

    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_non_get_bypasses_cache_both_ways() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_secs(5)));
    let calls = Arc::new(AtomicUsize::new(0));
    let payload = json!({"q": "pumps"});

    // Seed the cache through a GET.
    let get_call = resolving(&calls, json!({"result": "from-get"}));
    dispatcher
        .execute(&get_call, ApiRequest::get("/search").with_data(payload.clone()))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A POST with identical endpoint/data must not read the entry...
    let post_call = resolving(&calls, json!({"result": "from-post"}));
    let posted = dispatcher
        .execute(&post_call, ApiRequest::post("/search").with_data(payload.clone()))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(posted, json!({"result": "from-post"}));

    // ...and must not have written over the GET entry either.
    let cached = dispatcher
        .execute(&get_call, ApiRequest::get("/search").with_data(payload))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cached, json!({"result": "from-get"}));
}

#[tokio::test]
async fn test_logging_enabled_does_not_alter_result() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let dispatcher = Dispatcher::new(Policy { enable_caching: true, ..Policy::default() });
    let calls = Arc::new(AtomicUsize::new(0));
    let call = resolving(&calls, json!({"id": 1}));

    let value = dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();
    assert_eq!(value, json!({"id": 1}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// In-memory log sink for asserting on emitted lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_logging_disabled_silences_cache_hits() {
    let logs = LogBuffer::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || sink.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dispatcher = Dispatcher::new(Policy {
        enable_caching: true,
        enable_logging: false,
        cache_duration: Duration::from_secs(5),
        ..Policy::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));
    let call = resolving(&calls, json!({"id": 1}));

    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();
    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(logs.contents().is_empty(), "disabled logging must emit nothing: {}", logs.contents());
}

#[tokio::test]
async fn test_logging_enabled_reports_cache_hits() {
    let logs = LogBuffer::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || sink.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dispatcher = Dispatcher::new(caching_policy_with_logging(Duration::from_secs(5)));
    let calls = Arc::new(AtomicUsize::new(0));
    let call = resolving(&calls, json!({"id": 1}));

    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();
    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();

    let output = logs.contents();
    assert!(output.contains("dispatching request"));
    assert!(output.contains("cache hit"));
}

fn caching_policy_with_logging(ttl: Duration) -> Policy {
    Policy { enable_caching: true, cache_duration: ttl, ..Policy::default() }
}

#[tokio::test]
async fn test_caching_disabled_always_calls() {
    let dispatcher =
        Dispatcher::new(Policy { enable_logging: false, ..Policy::default() });
    let calls = Arc::new(AtomicUsize::new(0));
    let call = resolving(&calls, json!({"id": 1}));

    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();
    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_clear_key_invalidates_single_entry() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_secs(5)));
    let calls = Arc::new(AtomicUsize::new(0));
    let call = resolving(&calls, json!({"id": 1}));

    let request = ApiRequest::get("/users/1");
    let other = ApiRequest::get("/users/2");
    dispatcher.execute(&call, request.clone()).await.unwrap();
    dispatcher.execute(&call, other.clone()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    dispatcher.clear(Some(&Dispatcher::cache_key(&request))).await;

    // Cleared entry refetches; the other stays cached.
    dispatcher.execute(&call, request).await.unwrap();
    dispatcher.execute(&call, other).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_clear_all_invalidates_everything() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_secs(5)));
    let calls = Arc::new(AtomicUsize::new(0));
    let call = resolving(&calls, json!({"id": 1}));

    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();
    dispatcher.execute(&call, ApiRequest::get("/users/2")).await.unwrap();
    dispatcher.clear(None).await;

    dispatcher.execute(&call, ApiRequest::get("/users/1")).await.unwrap();
    dispatcher.execute(&call, ApiRequest::get("/users/2")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_clear_absent_key_is_harmless() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_secs(5)));
    dispatcher.clear(Some("GET:/nowhere:{}")).await;
    dispatcher.clear(None).await;
}

#[tokio::test]
async fn test_success_refreshes_stale_entry() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_millis(60)));
    let calls = Arc::new(AtomicUsize::new(0));

    let first = resolving(&calls, json!({"rev": 1}));
    dispatcher.execute(&first, ApiRequest::get("/doc")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;

    // Stale entry reads as a miss; the refetched value replaces it.
    let second = resolving(&calls, json!({"rev": 2}));
    dispatcher.execute(&second, ApiRequest::get("/doc")).await.unwrap();

    let cached = dispatcher.execute(&second, ApiRequest::get("/doc")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cached, json!({"rev": 2}));
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn test_retry_exhaustion_invokes_retry_count_plus_one() {
    let dispatcher = Dispatcher::new(Policy {
        retry_count: 2,
        retry_delay: Duration::from_millis(40),
        enable_logging: false,
        ..Policy::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));
    let call = rejecting(&calls, "boom");

    let started = Instant::now();
    let err = dispatcher
        .execute(&call, ApiRequest::get("/flaky"))
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(err, "boom");
    // Two inter-attempt delays of 40ms each.
    assert!(started.elapsed() >= Duration::from_millis(80));
}

#[tokio::test]
async fn test_retry_succeeds_on_third_attempt() {
    let dispatcher = Dispatcher::new(Policy {
        retry_count: 2,
        retry_delay: Duration::from_millis(1),
        enable_logging: false,
        ..Policy::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let call = move |_req: ApiRequest| {
        let calls = Arc::clone(&counter);
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err("transient".to_string()) } else { Ok(json!({"attempt": n + 1})) }
        }
    };

    let value = dispatcher.execute(call, ApiRequest::get("/flaky")).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(value, json!({"attempt": 3}));
}

#[tokio::test]
async fn test_zero_retries_fails_after_single_attempt() {
    let dispatcher = Dispatcher::new(Policy { enable_logging: false, ..Policy::default() });
    let calls = Arc::new(AtomicUsize::new(0));
    let call = rejecting(&calls, "fatal");

    let err = dispatcher.execute(&call, ApiRequest::post("/submit")).await.unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err, "fatal");
}

#[tokio::test]
async fn test_failed_get_writes_nothing_to_cache() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_secs(5)));
    let calls = Arc::new(AtomicUsize::new(0));

    let failing = rejecting(&calls, "down");
    let _ = dispatcher.execute(&failing, ApiRequest::get("/users/1")).await;

    let ok = resolving(&calls, json!({"id": 1}));
    dispatcher.execute(&ok, ApiRequest::get("/users/1")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Concurrency and identity
// =============================================================================

#[tokio::test]
async fn test_concurrent_identical_gets_both_miss() {
    // No single-flight coalescing: two in-flight identical GETs each call.
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_secs(5)));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let call = move |_req: ApiRequest| {
        let calls = Arc::clone(&counter);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<_, String>(json!({"id": 1}))
        }
    };

    let (a, b) = tokio::join!(
        dispatcher.execute(&call, ApiRequest::get("/users/1")),
        dispatcher.execute(&call, ApiRequest::get("/users/1")),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_shared_dispatcher_is_a_single_instance() {
    assert!(std::ptr::eq(Dispatcher::shared(), Dispatcher::shared()));
    assert!(!Dispatcher::shared().policy().enable_caching);
}

// =============================================================================
// Example scenario (scaled-down timings)
// =============================================================================

#[tokio::test]
async fn test_fetch_user_scenario() {
    let dispatcher = Dispatcher::new(caching_policy(Duration::from_millis(250)));
    let calls = Arc::new(AtomicUsize::new(0));
    let fetch_user = resolving(&calls, json!({"id": 1, "name": "A"}));
    let request = ApiRequest::get("/users/1");

    // First call invokes and caches.
    let value = dispatcher.execute(&fetch_user, request.clone()).await.unwrap();
    assert_eq!(value, json!({"id": 1, "name": "A"}));

    // Within the TTL: served from cache.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let value = dispatcher.execute(&fetch_user, request.clone()).await.unwrap();
    assert_eq!(value, json!({"id": 1, "name": "A"}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Past the TTL: invoked again.
    tokio::time::sleep(Duration::from_millis(250)).await;
    dispatcher.execute(&fetch_user, request).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
