//! Registration endpoint tests
//!
//! Drive `POST /api/auth/register` over real HTTP with a mock siteverify
//! provider behind it.

use std::sync::Arc;

use crew_recaptcha::PolicyConfig;
use crew_server::store::{NewUser, StoreError, User};
use crew_server::{UserStore, register::VERIFICATION_FAILED_MESSAGE};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    SITEVERIFY_PATH, TEST_SECRET, enabled_policy, mount_score, mount_siteverify, registration,
    spawn_server, spawn_with_store, start_provider_mock, verifier_for,
};

#[tokio::test]
async fn verified_registration_creates_user() {
    let provider = start_provider_mock().await;
    Mock::given(method("POST"))
        .and(path(SITEVERIFY_PATH))
        .and(body_string_contains(format!("secret={TEST_SECRET}")))
        .and(body_string_contains("response=valid-token-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "score": 0.9,
            "action": "register",
            "hostname": "localhost"
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let server = spawn_server(verifier_for(&provider), enabled_policy()).await;
    let (status, body) = server
        .register(registration("test@example.com", Some("valid-token-xyz")))
        .await;

    assert_eq!(status, 201, "{body}");
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["name"], "Test User");
    assert_eq!(body["user"]["email"], "test@example.com");
    assert_eq!(body["user"]["role"], "volunteer");
    assert_eq!(body["user"]["profileComplete"], false);
    assert!(body["user"]["id"].is_string());
    assert!(body["user"].get("password").is_none());

    let stored = server.users.find_by_email("test@example.com").unwrap().unwrap();
    assert_ne!(stored.password_hash, "password123");
}

#[tokio::test]
async fn low_score_is_rejected_with_details() {
    let provider = start_provider_mock().await;
    mount_score(&provider, 0.2).await;

    let server = spawn_server(verifier_for(&provider), enabled_policy()).await;
    let (status, body) = server
        .register(registration("bot@example.com", Some("low-score-token")))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["message"], VERIFICATION_FAILED_MESSAGE);
    let details = &body["recaptchaDetails"];
    assert!(details["message"].as_str().unwrap().contains("score too low"));
    assert_eq!(details["score"], 0.2);
    assert_eq!(details["threshold"], 0.3);
    assert_eq!(details["hostname"], "localhost");
    assert_eq!(details["action"], "register");
    assert!(server.users.is_empty());
}

#[tokio::test]
async fn provider_rejection_surfaces_error_codes() {
    let provider = start_provider_mock().await;
    mount_siteverify(
        &provider,
        serde_json::json!({"success": false, "error-codes": ["invalid-input-response"]}),
    )
    .await;

    let server = spawn_server(verifier_for(&provider), enabled_policy()).await;
    let (status, body) = server
        .register(registration("test@example.com", Some("invalid-token")))
        .await;

    assert_eq!(status, 400);
    assert_eq!(
        body["recaptchaDetails"]["errors"],
        serde_json::json!(["invalid-input-response"])
    );
    assert!(server.users.is_empty());
}

#[tokio::test]
async fn missing_token_is_rejected_without_calling_provider() {
    let provider = start_provider_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider)
        .await;

    let server = spawn_server(verifier_for(&provider), enabled_policy()).await;
    let (status, body) = server.register(registration("test@example.com", None)).await;

    assert_eq!(status, 400);
    assert!(
        body["recaptchaDetails"]["message"]
            .as_str()
            .unwrap()
            .contains("no token provided")
    );
}

#[tokio::test]
async fn missing_secret_is_reported_as_misconfiguration() {
    let provider = start_provider_mock().await;
    let server = spawn_server(verifier_for(&provider), PolicyConfig::default()).await;

    let (status, body) = server
        .register(registration("test@example.com", Some("token")))
        .await;

    assert_eq!(status, 400);
    assert!(
        body["recaptchaDetails"]["message"]
            .as_str()
            .unwrap()
            .contains("secret key not configured")
    );
}

#[tokio::test]
async fn disabled_verification_accepts_null_token() {
    let provider = start_provider_mock().await;
    let server = spawn_server(verifier_for(&provider), PolicyConfig::disabled()).await;

    let (status, body) = server.register(registration("dev@example.com", None)).await;

    assert_eq!(status, 201, "{body}");
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(server.users.len(), 1);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let provider = start_provider_mock().await;
    mount_score(&provider, 0.9).await;

    let server = spawn_server(verifier_for(&provider), enabled_policy()).await;
    let (first, _) = server
        .register(registration("test@example.com", Some("token-1")))
        .await;
    assert_eq!(first, 201);

    let (status, body) = server
        .register(registration("test@example.com", Some("token-2")))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "User with this email already exists");
    assert_eq!(server.users.len(), 1);
}

#[tokio::test]
async fn invalid_fields_are_rejected_after_verification() {
    let provider = start_provider_mock().await;
    mount_score(&provider, 0.9).await;

    let server = spawn_server(verifier_for(&provider), enabled_policy()).await;
    let mut body = registration("not-an-email", Some("token"));
    body["password"] = serde_json::json!("pw");

    let (status, body) = server.register(body).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Please provide a valid email");
    assert!(body.get("recaptchaDetails").is_none());
}

#[tokio::test]
async fn unreachable_provider_is_rejected() {
    let provider = start_provider_mock().await;
    let verifier = verifier_for(&provider);
    drop(provider);

    let server = spawn_server(verifier, enabled_policy()).await;
    let (status, body) = server
        .register(registration("test@example.com", Some("token")))
        .await;

    assert_eq!(status, 400);
    assert!(
        body["recaptchaDetails"]["message"]
            .as_str()
            .unwrap()
            .starts_with("reCAPTCHA verification error:")
    );
}

/// Store that is always down.
struct UnavailableStore;

impl UserStore for UnavailableStore {
    fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("Database connection failed".to_string()))
    }

    fn insert(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Unavailable("Database connection failed".to_string()))
    }
}

#[tokio::test]
async fn store_failure_is_server_error() {
    let provider = start_provider_mock().await;
    mount_score(&provider, 0.9).await;

    let addr = spawn_with_store(
        verifier_for(&provider),
        enabled_policy(),
        Arc::new(UnavailableStore),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/register"))
        .json(&registration("test@example.com", Some("token")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Database connection failed")
    );
}

#[tokio::test]
async fn health_endpoint_responds() {
    let provider = start_provider_mock().await;
    let server = spawn_server(verifier_for(&provider), enabled_policy()).await;

    let response = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}
