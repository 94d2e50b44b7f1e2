use std::time::Duration;

use codelink::{
    auth::{CODE_TIMEOUT, NonceCodeRegistry},
    error::AuthError,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_resolve_settles_pending_request() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();
    let pending = registry.register("n1").unwrap();

    assert!(registry.is_pending("n1"));
    assert!(registry.resolve_code("n1", "42"));
    assert!(!registry.is_pending("n1"));

    assert_eq!(pending.wait(&cancel).await.unwrap(), "42");
}

#[tokio::test]
async fn test_later_deliveries_are_noops() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();
    let pending = registry.register("n1").unwrap();

    assert!(registry.resolve_code("n1", "first"));
    assert!(!registry.resolve_code("n1", "second"));
    assert!(!registry.reject_code("n1", AuthError::Cancelled));
    cancel.cancel();

    // cancellation after settlement does not change the outcome
    assert_eq!(pending.wait(&cancel).await.unwrap(), "first");
}

#[tokio::test]
async fn test_unknown_nonce_is_noop() {
    let registry = NonceCodeRegistry::new();
    assert!(!registry.resolve_code("nobody", "42"));
    assert_eq!(registry.pending_count(), 0);
}

#[tokio::test]
async fn test_duplicate_nonce_is_rejected() {
    let registry = NonceCodeRegistry::new();
    let _pending = registry.register("n1").unwrap();

    let err = registry.register("n1").err().unwrap();
    assert!(matches!(err, AuthError::DuplicateNonce(nonce) if nonce == "n1"));
    assert_eq!(registry.pending_count(), 1);
}

#[tokio::test]
async fn test_reject_code() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();
    let pending = registry.register("n1").unwrap();

    assert!(registry.reject_code("n1", AuthError::Ui("gone".to_string())));
    let err = pending.wait(&cancel).await.unwrap_err();
    assert!(matches!(err, AuthError::Ui(_)));
}

#[tokio::test]
async fn test_cancellation_rejects_and_removes() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = registry.wait_for_code("n1", &cancel).await.unwrap_err();
    assert!(err.is_cancellation());

    // the entry is gone, so a late delivery is a no-op
    assert!(!registry.is_pending("n1"));
    assert!(!registry.resolve_code("n1", "42"));
}

#[tokio::test]
async fn test_cancellation_while_waiting() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();

    let waiter = {
        let registry = registry.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { registry.wait_for_code("n1", &cancel).await })
    };

    while !registry.is_pending("n1") {
        tokio::task::yield_now().await;
    }
    cancel.cancel();

    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(err, AuthError::Cancelled));
    assert_eq!(registry.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_after_sixty_seconds() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let err = registry.wait_for_code("n1", &cancel).await.unwrap_err();

    assert!(err.is_timeout());
    assert!(err.to_string().contains("Timed out"));
    let elapsed = started.elapsed();
    assert!(elapsed >= CODE_TIMEOUT);
    assert!(elapsed < CODE_TIMEOUT + Duration::from_secs(1));
    assert!(!registry.resolve_code("n1", "late"));
}

#[tokio::test(start_paused = true)]
async fn test_no_timeout_before_ceiling() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();
    let pending = registry.register("n1").unwrap();

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert!(registry.is_pending("n1"));
    assert!(registry.resolve_code("n1", "42"));

    assert_eq!(pending.wait(&cancel).await.unwrap(), "42");
}

#[tokio::test(start_paused = true)]
async fn test_custom_timeout() {
    let registry = NonceCodeRegistry::with_timeout(Duration::from_secs(5));
    let cancel = CancellationToken::new();

    let err = registry.wait_for_code("n1", &cancel).await.unwrap_err();
    assert!(matches!(err, AuthError::Timeout(timeout) if timeout == Duration::from_secs(5)));
}

#[tokio::test(start_paused = true)]
async fn test_stale_timer_does_not_touch_new_registration() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();

    let first = registry.register("n1").unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(registry.resolve_code("n1", "a"));
    assert_eq!(first.wait(&cancel).await.unwrap(), "a");

    let second = registry.register("n1").unwrap();
    // past the first registration's deadline, before the second's
    tokio::time::sleep(Duration::from_secs(40)).await;
    assert!(registry.is_pending("n1"));
    assert!(registry.resolve_code("n1", "b"));
    assert_eq!(second.wait(&cancel).await.unwrap(), "b");
}

#[tokio::test]
async fn test_dropping_waiter_withdraws_registration() {
    let registry = NonceCodeRegistry::new();
    let pending = registry.register("n1").unwrap();
    assert_eq!(pending.nonce(), "n1");

    drop(pending);
    assert!(!registry.is_pending("n1"));

    // the nonce can be used again
    assert!(registry.register("n1").is_ok());
}

#[tokio::test]
async fn test_independent_registries() {
    let a = NonceCodeRegistry::new();
    let b = NonceCodeRegistry::new();
    let _pending = a.register("n1").unwrap();

    assert!(!b.resolve_code("n1", "42"));
    assert!(a.is_pending("n1"));
}
