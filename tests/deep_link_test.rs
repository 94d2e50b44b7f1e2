use std::collections::HashMap;

use axum::{Extension, extract::Query};
use codelink::{
    api::{DEEP_LINK_BASE, callback, deep_link_from_query},
    auth::{CallbackParams, DeepLinkListener, NonceCodeRegistry},
    error::AuthError,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_callback_params_from_uri() {
    let uri = Url::parse("codelink://auth/callback?nonce=n1&code=42&extra=1").unwrap();
    let params = CallbackParams::from_uri(&uri).unwrap();
    assert_eq!(params.nonce, "n1");
    assert_eq!(params.code, "42");
}

#[test]
fn test_callback_params_require_nonce_and_code() {
    let missing_code = Url::parse("codelink://auth/callback?nonce=n1").unwrap();
    assert!(matches!(
        CallbackParams::from_uri(&missing_code),
        Err(AuthError::MalformedCallback(field)) if field == "code"
    ));

    let empty_nonce = Url::parse("codelink://auth/callback?nonce=&code=42").unwrap();
    assert!(matches!(
        CallbackParams::from_uri(&empty_nonce),
        Err(AuthError::MalformedCallback(field)) if field == "nonce"
    ));
}

#[tokio::test]
async fn test_listener_resolves_pending_nonce() {
    let registry = NonceCodeRegistry::new();
    let listener = DeepLinkListener::new(registry.clone());
    let cancel = CancellationToken::new();
    let pending = registry.register("n1").unwrap();

    assert!(listener.handle_raw("codelink://auth/callback?nonce=n1&code=42"));
    assert_eq!(pending.wait(&cancel).await.unwrap(), "42");
}

#[tokio::test]
async fn test_listener_ignores_malformed_uris() {
    let registry = NonceCodeRegistry::new();
    let listener = DeepLinkListener::new(registry.clone());
    let _pending = registry.register("n1").unwrap();

    assert!(!listener.handle_raw("codelink://auth/callback?nonce=n1"));
    assert!(!listener.handle_raw("codelink://auth/callback?nonce=n1&code="));
    assert!(!listener.handle_raw("codelink://auth/callback?code=42"));
    assert!(!listener.handle_raw("not a uri"));
    assert!(!listener.handle_raw("codelink://auth/callback?nonce=other&code=42"));

    // the pending request is untouched
    assert!(registry.is_pending("n1"));
}

#[tokio::test]
async fn test_spawned_listener_consumes_stream() {
    let registry = NonceCodeRegistry::new();
    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = DeepLinkListener::new(registry.clone()).spawn(rx);

    let pending = registry.register("n1").unwrap();
    tx.send(Url::parse("codelink://auth/callback?nonce=n1").unwrap())
        .unwrap();
    tx.send(Url::parse("codelink://auth/callback?nonce=n1&code=abc").unwrap())
        .unwrap();

    assert_eq!(pending.wait(&cancel).await.unwrap(), "abc");

    drop(tx);
    handle.await.unwrap();
}

#[test]
fn test_deep_link_from_query_with_nonce() {
    let uri = deep_link_from_query(&query(&[("nonce", "n1"), ("code", "42")])).unwrap();
    assert!(uri.as_str().starts_with(DEEP_LINK_BASE));

    let params = CallbackParams::from_uri(&uri).unwrap();
    assert_eq!(params.nonce, "n1");
    assert_eq!(params.code, "42");
}

#[test]
fn test_deep_link_from_query_lifts_nonce_from_state() {
    let uri = deep_link_from_query(&query(&[
        ("code", "42"),
        ("state", "http://127.0.0.1:8080/callback?nonce=n%2B1"),
    ]))
    .unwrap();

    let params = CallbackParams::from_uri(&uri).unwrap();
    assert_eq!(params.nonce, "n+1");
    assert_eq!(params.code, "42");
}

#[test]
fn test_deep_link_from_query_requires_code_and_nonce() {
    assert!(deep_link_from_query(&query(&[("nonce", "n1")])).is_none());
    assert!(deep_link_from_query(&query(&[("nonce", "n1"), ("code", "")])).is_none());
    assert!(deep_link_from_query(&query(&[("code", "42")])).is_none());
    assert!(deep_link_from_query(&query(&[("code", "42"), ("state", "garbage")])).is_none());
}

#[tokio::test]
async fn test_callback_handler_forwards_deep_link() {
    let registry = NonceCodeRegistry::new();
    let _pending = registry.register("n1").unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let page = callback(
        Query(query(&[("nonce", "n1"), ("code", "42")])),
        Extension(registry.clone()),
        Extension(tx.clone()),
    )
    .await;
    assert!(page.0.contains("Authorization code received"));

    let uri = rx.recv().await.unwrap();
    assert_eq!(CallbackParams::from_uri(&uri).unwrap().code, "42");

    let page = callback(
        Query(query(&[("nonce", "n1")])),
        Extension(registry),
        Extension(tx),
    )
    .await;
    assert!(page.0.contains("Missing authorization code"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_callback_handler_rejects_code_nobody_waits_for() {
    let registry = NonceCodeRegistry::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let page = callback(
        Query(query(&[("nonce", "stale"), ("code", "42")])),
        Extension(registry),
        Extension(tx),
    )
    .await;

    assert!(!page.0.contains("Authorization code received"));
    assert!(page.0.contains("No login is waiting"));
    assert!(rx.try_recv().is_err());
}
