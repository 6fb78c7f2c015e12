//! HTTP-level integration tests for registration, login and token use.

mod common;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::body::Body;
use common::{body_json, build_test_app, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn register_returns_201_with_token_and_user() {
    let app = build_test_app();
    let body = json!({ "username": "alice", "email": "Alice@Test.com", "password": TEST_PASSWORD });

    let response = app
        .request(Method::POST, "/api/auth/register", Some(body), None)
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "User registered successfully");
    assert!(json["token"].is_string());
    assert_eq!(json["data"]["username"], "alice");
    assert_eq!(json["data"]["email"], "alice@test.com");
    assert!(json["data"].get("passwordHash").is_none());
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn duplicate_email_is_rejected_with_400() {
    let app = build_test_app();
    app.register("alice").await;

    let body = json!({ "username": "alice2", "email": "ALICE@test.com", "password": TEST_PASSWORD });
    let response = app
        .request(Method::POST, "/api/auth/register", Some(body), None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Duplicate field value entered for 'email'");
}

#[tokio::test]
async fn invalid_registration_reports_field_errors() {
    let app = build_test_app();
    let body = json!({ "username": "al", "email": "nope", "password": "123" });

    let response = app
        .request(Method::POST, "/api/auth/register", Some(body), None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Validation failed");
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "username"]);
}

#[tokio::test]
async fn login_issues_a_token_that_authenticates_the_user() {
    let app = build_test_app();
    let (_, user_id) = app.register("bob").await;

    let body = json!({ "email": "bob@test.com", "password": TEST_PASSWORD });
    let response = app
        .request(Method::POST, "/api/auth/login", Some(body), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "User logged in successfully");
    let token = json["token"].as_str().unwrap();

    let response = app.get("/api/auth/me", token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], user_id);
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let app = build_test_app();
    app.register("carol").await;

    let body = json!({ "email": "carol@test.com", "password": "wrong-password" });
    let response = app
        .request(Method::POST, "/api/auth/login", Some(body), None)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid credentials");
}

#[tokio::test]
async fn login_with_unknown_email_is_401() {
    let app = build_test_app();
    let body = json!({ "email": "ghost@test.com", "password": TEST_PASSWORD });

    let response = app
        .request(Method::POST, "/api/auth/login", Some(body), None)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_without_password_is_400() {
    let app = build_test_app();
    let body = json!({ "email": "dave@test.com" });

    let response = app
        .request(Method::POST, "/api/auth/login", Some(body), None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Please provide an email and password"
    );
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = build_test_app();

    let response = app.request(Method::GET, "/api/todos", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Not authorized to access this route");

    let response = app.get("/api/todos", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_cookie_authenticates_without_header() {
    let app = build_test_app();
    let (token, user_id) = app.register("erin").await;

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], user_id);
}
