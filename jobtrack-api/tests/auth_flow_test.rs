/// Auth and session lifecycle over HTTP
///
/// Drives the real router with the in-memory credential store; no
/// database required.

mod common;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{TestContext, PASSWORD};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_root_and_security_headers() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(common::request(Method::GET, "/", None, Body::empty(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-content-type-options").is_some());

    let (status, body) = ctx.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Job Application Tracker API is running!");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_register_access_logout() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/register",
            None,
            json!({
                "name": "Alice",
                "email": "alice@example.com",
                "phone_number": "+6281234567890",
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert_eq!(body["data"]["user"]["phone_number"], "+6281234567890");
    assert!(body["data"]["user"].get("password_hash").is_none());
    assert_eq!(body["data"]["tokens"]["expires_in"], 3600);

    let access_token = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = ctx.get("/users/profile-data", Some(&access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Alice");

    let (status, body) = ctx
        .json(Method::POST, "/auth/logout", Some(&access_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    // Token is still within its lifetime but the session is gone
    let (status, body) = ctx.get("/users/profile-data", Some(&access_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Invalid token or session expired");
}

#[tokio::test]
async fn test_register_duplicate_is_rejected() {
    let ctx = TestContext::new();
    let user = ctx.register("Bob").await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/register",
            None,
            json!({
                "name": "Bobby",
                "email": "someone-else@example.com",
                "phone_number": user.phone_number,
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "User with this email or phone number already exists"
    );
}

#[tokio::test]
async fn test_register_validation_envelope() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/register",
            None,
            json!({
                "name": "Carol",
                "email": "not-an-email",
                "phone_number": "0812345678",
                "password": "123",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Valid email is required");

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "phone_number"]);
}

#[tokio::test]
async fn test_malformed_json_uses_envelope() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(common::request(
            Method::POST,
            "/auth/login",
            None,
            Body::from("{not json"),
            Some("application/json"),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["status_code"], 400);
}

#[tokio::test]
async fn test_login_with_email_or_phone() {
    let ctx = TestContext::new();
    let user = ctx.register("Dana").await;

    for identifier in [&user.email, &user.phone_number] {
        let (status, body) = ctx
            .json(
                Method::POST,
                "/auth/login",
                None,
                json!({ "identifier": identifier, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login with {} failed", identifier);
        assert_eq!(body["data"]["user"]["id"], user.id.to_string());
        assert!(body["data"]["tokens"]["access_token"].is_string());
    }

    // Register plus two logins
    assert_eq!(ctx.store.session_count(user.id).await, 3);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = TestContext::new();
    let user = ctx.register("Evan").await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/login",
            None,
            json!({ "identifier": user.email, "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/login",
            None,
            json!({ "identifier": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = ctx
        .json(Method::POST, "/auth/login", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email or phone number is required");
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let ctx = TestContext::new();
    let user = ctx.register("Fay").await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/refresh-token",
            None,
            json!({ "refresh_token": user.refresh_token }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token refreshed successfully");

    let new_refresh = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();
    let new_access = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, user.refresh_token);

    // The old refresh token was rotated out
    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/refresh-token",
            None,
            json!({ "refresh_token": user.refresh_token }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");

    let (status, _) = ctx.get("/users/profile-data", Some(&new_access)).await;
    assert_eq!(status, StatusCode::OK);

    // Rotation updates in place
    assert_eq!(ctx.store.session_count(user.id).await, 1);
}

#[tokio::test]
async fn test_refresh_requires_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .json(Method::POST, "/auth/refresh-token", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Refresh token is required");

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/refresh-token",
            None,
            json!({ "refresh_token": "not.a.token" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");
}

#[tokio::test]
async fn test_refresh_after_logout_fails() {
    let ctx = TestContext::new();
    let user = ctx.register("Gus").await;

    let (status, _) = ctx
        .json(Method::POST, "/auth/logout", Some(&user.access_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/refresh-token",
            None,
            json!({ "refresh_token": user.refresh_token }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");
}

#[tokio::test]
async fn test_gate_rejects_missing_and_invalid_tokens() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/users/profile-data", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access denied. No token provided.");

    let (status, body) = ctx.get("/job-applications", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");

    // A refresh token is not an access token
    let user = ctx.register("Hana").await;
    let (status, _) = ctx.get("/users/profile-data", Some(&user.refresh_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let ctx = TestContext::new();
    let user = ctx.register("Ivan").await;

    ctx.store
        .set_session_expiry(user.id, Utc::now() - Duration::seconds(1))
        .await;

    let (status, body) = ctx.get("/users/profile-data", Some(&user.access_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Session expired");

    let (status, body) = ctx
        .json(
            Method::POST,
            "/auth/refresh-token",
            None,
            json!({ "refresh_token": user.refresh_token }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Session expired");
}

#[tokio::test]
async fn test_unknown_route_and_method_use_envelope() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/no-such-route", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["status_code"], 404);
    assert_eq!(body["message"], "Route not found");

    let response = ctx
        .app
        .clone()
        .oneshot(common::request(Method::PATCH, "/health", None, Body::empty(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers().get("allow").is_some());

    let (status, body) = ctx
        .json(Method::PATCH, "/health", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], "error");
    assert_eq!(body["status_code"], 405);
}

#[tokio::test]
async fn test_legacy_schedule_path_is_mounted() {
    let ctx = TestContext::new();

    for uri in ["/schedules/my-schedules", "/schedules/my-shedules"] {
        let (status, body) = ctx.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["message"], "Access denied. No token provided.");
    }
}
