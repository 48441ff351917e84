mod common;

use axum::http::StatusCode;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use users_api::Claims;
use users_config::AppConfig;
use users_testing_utils::TestEnv;

use common::{json_body, TestAppBuilder};

#[tokio::test]
async fn test_login_and_profile() {
    let app = TestAppBuilder::new().build();
    let email = TestEnv::unique_email("login");
    let user = app.register("Erin", &email, "password123").await;

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": email, "password": "password123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = json_body(response).await;
    assert_eq!(login["token_type"], "Bearer");
    assert_eq!(login["user_id"], user["id"]);
    assert!(login["expires_at"].as_i64().unwrap() > Utc::now().timestamp());

    let token = login["access_token"].as_str().unwrap();
    let response = app.get("/auth/profile", Some(token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = json_body(response).await;
    assert_eq!(profile["id"], user["id"]);
    assert_eq!(profile["email"], email.as_str());
    assert_eq!(profile["roles"], json!(["user"]));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestAppBuilder::new().build();
    let email = TestEnv::unique_email("wrong");
    app.register("Frank", &email, "password123").await;

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": email, "password": "password999" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Invalid credentials");
    assert_eq!(body["path"], "/auth/login");
}

#[tokio::test]
async fn test_login_with_unknown_email() {
    let app = TestAppBuilder::new().build();

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": "password123" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_profile_rejects_malformed_token() {
    let app = TestAppBuilder::new().build();

    let response = app.get("/auth/profile", Some("not.a.jwt")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["message"],
        "Invalid authentication token"
    );
}

#[tokio::test]
async fn test_profile_rejects_expired_token() {
    let app = TestAppBuilder::new().build();
    let secret = AppConfig::default().auth.jwt_secret;
    let issued = Utc::now().timestamp() - 7200;
    let claims = Claims {
        sub: "1".to_string(),
        email: "old@example.com".to_string(),
        roles: vec!["user".to_string()],
        iat: issued,
        exp: issued + 60,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    let response = app.get("/auth/profile", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["message"],
        "Authentication token has expired"
    );
}

#[tokio::test]
async fn test_profile_rejects_token_signed_with_other_secret() {
    let app = TestAppBuilder::new().build();
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "1".to_string(),
        email: "forged@example.com".to_string(),
        roles: vec!["admin".to_string()],
        iat: now,
        exp: now + 3600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let response = app.get("/auth/profile", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
