//! Request pipeline integration tests
//!
//! Deterministic tests against the scripted transport. Time is paused, so backoff
//! intervals are observed exactly.

use crate::common::{bearer, tokens, Harness, Reply, REFRESH_PATH};
use assert_matches::assert_matches;
use futures_util::future::join_all;
use pressroom::client::pipeline::ApiError;
use pressroom::client::storage::Storage;
use pressroom::client::transport::{ApiRequest, RequestBody, RequestOptions};
use pressroom::shared::ClientConfig;
use pretty_assertions::assert_eq;
use reqwest::Method;
use serde_json::json;
use std::time::Duration;

const ME: &str = "/api/auth/me";

/// Tokens `a1` are rejected, `a2` accepted
fn expire_a1(harness: &Harness) {
    harness.transport.respond_with(Method::GET, ME, |request| {
        match request.header(&reqwest::header::AUTHORIZATION) {
            Some("Bearer a2") => Reply::ok(json!({ "id": "u1", "username": "ada" })),
            _ => Reply::status(401),
        }
    });
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_401s_share_one_refresh() {
    let harness = Harness::new().signed_in();
    expire_a1(&harness);
    harness.transport.on(
        Method::POST,
        REFRESH_PATH,
        Reply::ok(json!({ "accessToken": "a2" })).after(Duration::from_millis(100)),
    );

    let calls = (0..8).map(|_| harness.client.get(ME));
    let results = join_all(calls).await;

    for result in results {
        assert!(result.is_ok(), "request failed: {:?}", result);
    }
    assert_eq!(harness.transport.count(Method::POST, REFRESH_PATH), 1);
    assert_eq!(harness.client.refresh_count(), 1);

    let replays: Vec<_> = harness
        .transport
        .calls_to(Method::GET, ME)
        .into_iter()
        .filter(|call| call.authorization == bearer("a2"))
        .collect();
    assert_eq!(replays.len(), 8);
    assert_eq!(harness.client.session().access_token.as_deref(), Some("a2"));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_request_shape() {
    let harness = Harness::new().signed_in();
    expire_a1(&harness);
    harness
        .transport
        .on(Method::POST, REFRESH_PATH, Reply::json(200, json!({ "accessToken": "a2", "refreshToken": "r2" })));

    crate::assert_ok!(harness.client.get(ME).await);

    let refresh = &harness.transport.calls_to(Method::POST, REFRESH_PATH)[0];
    assert_eq!(refresh.authorization, None);
    assert_eq!(refresh.body, RequestBody::Json(json!({ "refreshToken": "r1" })));

    // Rotated refresh token is persisted
    assert_eq!(harness.storage.get("refreshToken").as_deref(), Some("r2"));
    assert_eq!(harness.storage.get("accessToken").as_deref(), Some("a2"));
}

#[tokio::test(start_paused = true)]
async fn test_replayed_401_is_terminal() {
    let harness = Harness::new().signed_in();
    harness.transport.always(Method::GET, ME, Reply::status(401));
    harness
        .transport
        .always(Method::POST, REFRESH_PATH, Reply::ok(json!({ "accessToken": "a2" })));

    let err = harness.client.get(ME).await.unwrap_err();

    assert_matches!(err, ApiError::AuthExpired { .. });
    assert_eq!(harness.transport.count(Method::POST, REFRESH_PATH), 1);
    assert_eq!(harness.transport.count(Method::GET, ME), 2);
    assert_eq!(harness.observer.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_rejects_all_waiters_and_expires_once() {
    let harness = Harness::new().signed_in();
    harness.transport.always(Method::GET, ME, Reply::status(401));
    harness.transport.on(
        Method::POST,
        REFRESH_PATH,
        Reply::json(401, json!({ "message": "Refresh token revoked" })).after(Duration::from_millis(50)),
    );

    let results = join_all((0..5).map(|_| harness.client.get(ME))).await;

    for result in results {
        assert_eq!(
            result.unwrap_err(),
            ApiError::auth_expired("Refresh token revoked")
        );
    }
    assert_eq!(harness.transport.count(Method::POST, REFRESH_PATH), 1);
    assert_eq!(harness.observer.count(), 1);
    assert!(!harness.client.is_authenticated());
    assert!(harness.storage.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_backoff_schedule_on_persistent_500() {
    let harness = Harness::new();
    harness.transport.always(Method::GET, "/api/posts", Reply::status(500));

    let err = harness.client.get("/api/posts").await.unwrap_err();
    assert_matches!(err, ApiError::Server { status: 500, .. });

    let calls = harness.transport.calls_to(Method::GET, "/api/posts");
    assert_eq!(calls.len(), 4);
    let gaps: Vec<_> = calls.windows(2).map(|pair| pair[1].at - pair[0].at).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4000)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_custom_retry_budget() {
    let config = ClientConfig::builder()
        .max_retries(1)
        .retry_delay(Duration::from_millis(250))
        .build()
        .unwrap();
    let harness = Harness::with_config(config);
    harness.transport.always(Method::GET, "/api/posts", Reply::network_error());

    let err = harness.client.get("/api/posts").await.unwrap_err();

    assert_matches!(err, ApiError::Network { .. });
    assert_eq!(harness.transport.count(Method::GET, "/api/posts"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_404_is_not_retried() {
    let harness = Harness::new();
    harness.transport.always(Method::GET, "/api/posts/nope", Reply::status(404));

    let err = harness.client.get("/api/posts/nope").await.unwrap_err();

    assert_matches!(err, ApiError::Client { status: 404, .. });
    assert_eq!(harness.transport.count(Method::GET, "/api/posts/nope"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_429_and_network_drop_are_retried() {
    let harness = Harness::new();
    harness
        .transport
        .on(Method::GET, "/api/posts", Reply::status(429))
        .on(Method::GET, "/api/posts", Reply::network_error())
        .on(Method::GET, "/api/posts", Reply::status(408))
        .on(Method::GET, "/api/posts", Reply::ok(json!([])));

    crate::assert_ok!(harness.client.get("/api/posts").await);
    assert_eq!(harness.transport.count(Method::GET, "/api/posts"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_no_token_means_no_header_and_no_refresh() {
    let harness = Harness::new();
    harness.transport.always(Method::GET, ME, Reply::status(401));

    let err = harness.client.get(ME).await.unwrap_err();

    assert_matches!(err, ApiError::AuthExpired { .. });
    let calls = harness.transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization, None);
    assert_eq!(harness.transport.count(Method::POST, REFRESH_PATH), 0);
    assert_eq!(harness.observer.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_access_token_without_refresh_token_expires_session() {
    let harness = Harness::new();
    harness.client.establish_session(tokens("a1", None));
    harness.transport.always(Method::GET, ME, Reply::status(401));

    let err = harness.client.get(ME).await.unwrap_err();

    assert_matches!(err, ApiError::AuthExpired { .. });
    assert_eq!(harness.transport.count(Method::POST, REFRESH_PATH), 0);
    assert_eq!(harness.observer.count(), 1);
    assert!(!harness.client.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_skip_refresh_surfaces_client_error() {
    let harness = Harness::new().signed_in();
    harness.transport.always(Method::POST, "/api/auth/logout", Reply::status(401));

    let options = RequestOptions {
        skip_refresh: true,
        ..RequestOptions::default()
    };
    let err = harness
        .client
        .send(ApiRequest::post("/api/auth/logout").options(options))
        .await
        .unwrap_err();

    assert_matches!(err, ApiError::Client { status: 401, .. });
    assert_eq!(harness.transport.count(Method::POST, REFRESH_PATH), 0);
    // The token was still attached
    assert_eq!(harness.transport.calls()[0].authorization, bearer("a1"));
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_spans_refresh_replay() {
    let harness = Harness::new().signed_in();
    harness
        .transport
        .on(Method::GET, ME, Reply::status(503))
        .on(Method::GET, ME, Reply::status(401))
        .on(Method::GET, ME, Reply::status(503))
        .on(Method::GET, ME, Reply::status(503))
        .on(Method::GET, ME, Reply::status(503));
    harness
        .transport
        .on(Method::POST, REFRESH_PATH, Reply::ok(json!({ "accessToken": "a2" })));

    let err = harness.client.get(ME).await.unwrap_err();

    assert_matches!(err, ApiError::Server { status: 503, .. });
    // 1 + 3 retries, plus the one replay after refresh
    assert_eq!(harness.transport.count(Method::GET, ME), 5);
}

#[tokio::test(start_paused = true)]
async fn test_per_call_headers_and_timeout_reach_transport() {
    let harness = Harness::new().signed_in();
    harness.transport.always(Method::GET, "/api/posts", Reply::ok(json!([])));

    let options = RequestOptions::default()
        .with_timeout(Duration::from_secs(5))
        .with_header(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en"),
        );
    crate::assert_ok!(
        harness
            .client
            .request(Method::GET, "/api/posts", None, Some(options))
            .await
    );

    assert_eq!(harness.transport.calls()[0].authorization, bearer("a1"));
}

#[tokio::test]
async fn test_session_restored_from_storage() {
    let first = Harness::new().signed_in();
    let storage = first.storage();

    let client = pressroom::client::ApiClient::builder(ClientConfig::default())
        .transport(first.transport.clone())
        .storage(storage)
        .build()
        .unwrap();

    assert_eq!(client.session().access_token.as_deref(), Some("a1"));
    client.end_session();
    assert!(first.storage.is_empty());
}
