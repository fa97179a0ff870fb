//! Router-level tests: requests go through the real axum router, layers
//! included, against the in-memory store.

use anyhow::{anyhow, Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use kunci::api::app;
use kunci::auth::OtpAction;
use kunci::mailer::LogMailer;
use kunci::store::MemStore;

fn test_app() -> (Router, Arc<MemStore>) {
    let store = Arc::new(MemStore::new());
    let router = app(store.clone(), Arc::new(LogMailer));
    (router, store)
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))
        .context("failed to build request")
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    serde_json::from_slice(&bytes).context("response body is not JSON")
}

#[tokio::test]
async fn health_reports_name_and_version() -> Result<()> {
    let (router, _) = test_app();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body.get("name").and_then(Value::as_str), Some("kunci"));
    Ok(())
}

#[tokio::test]
async fn register_verify_login_over_http() -> Result<()> {
    let (router, store) = test_app();

    let response = router
        .clone()
        .oneshot(post_json(
            "/register",
            &json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "hunter2",
                "role": "customer",
                "address": "1 Main St"
            }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await?;
    assert_eq!(body.get("is_verified").and_then(Value::as_bool), Some(false));
    let user_id = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing user id"))?
        .to_string();

    // Unverified accounts cannot log in.
    let response = router
        .clone()
        .oneshot(post_json(
            "/login",
            &json!({ "email": "alice@example.com", "password": "hunter2" }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Pull the code straight from the store, as a user would from their inbox.
    let uuid = user_id.parse()?;
    let code = store
        .active_otps(uuid, OtpAction::Register)
        .first()
        .map(|otp| otp.code.clone())
        .ok_or_else(|| anyhow!("no active code"))?;

    let response = router
        .clone()
        .oneshot(post_json(
            "/verify/register",
            &json!({ "user_id": user_id, "otp_code": code }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body.get("status").and_then(Value::as_str), Some("logged_in"));

    let response = router
        .oneshot(post_json(
            "/login",
            &json!({ "email": "alice@example.com", "password": "hunter2" }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn password_reset_over_http() -> Result<()> {
    let (router, store) = test_app();

    let response = router
        .clone()
        .oneshot(post_json(
            "/register",
            &json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "hunter2",
                "role": "customer",
                "address": "1 Main St"
            }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(post_json(
            "/password/reset",
            &json!({ "email": "alice@example.com" }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await?;
    let user_id = body
        .get("user_id")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing user id"))?
        .to_string();

    let uuid = user_id.parse()?;
    let code = store
        .active_otps(uuid, OtpAction::PasswordReset)
        .first()
        .map(|otp| otp.code.clone())
        .ok_or_else(|| anyhow!("no active code"))?;

    let response = router
        .clone()
        .oneshot(post_json(
            "/verify/password_reset",
            &json!({ "user_id": user_id, "otp_code": code }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(
        body.get("status").and_then(Value::as_str),
        Some("proceed_to_reset")
    );
    let ticket = body
        .get("reset_ticket")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing reset ticket"))?
        .to_string();

    let response = router
        .clone()
        .oneshot(post_json(
            "/password/reset/confirm",
            &json!({
                "user_id": user_id,
                "reset_ticket": ticket,
                "new_password": "correct horse",
                "confirm_password": "correct horse"
            }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(post_json(
            "/login",
            &json!({ "email": "alice@example.com", "password": "correct horse" }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn register_rejects_unknown_role() -> Result<()> {
    let (router, _) = test_app();

    let response = router
        .oneshot(post_json(
            "/register",
            &json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "hunter2",
                "role": "superuser"
            }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn register_rejects_missing_payload() -> Result<()> {
    let (router, _) = test_app();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn verify_rejects_unknown_action() -> Result<()> {
    let (router, _) = test_app();

    let response = router
        .oneshot(post_json(
            "/verify/mfa",
            &json!({
                "user_id": "00000000-0000-0000-0000-000000000000",
                "otp_code": "AB12cd"
            }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn responses_carry_a_request_id() -> Result<()> {
    let (router, _) = test_app();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let (router, _) = test_app();

    let response = router
        .oneshot(Request::builder().uri("/openapi.json").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert!(body.get("paths").is_some());
    Ok(())
}
