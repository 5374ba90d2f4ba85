//! `POST /api/auth/register`.
//!
//! Order matters: the reCAPTCHA verdict is checked before any field is looked
//! at, so bots never learn which emails are registered.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | Verdict failed | 400 | `{message, recaptchaDetails}` |
//! | Invalid field | 400 | `{message}` |
//! | Email taken | 400 | `{message}` |
//! | Created | 201 | `{user, message}` |
//! | Store/hash failure | 500 | `{message}` |

use std::sync::LazyLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crew_recaptcha::VerdictDetails;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::store::{NewUser, StoreError, UserSummary};

pub const VERIFICATION_FAILED_MESSAGE: &str = "reCAPTCHA verification failed. Please try again.";
pub const EMAIL_TAKEN_MESSAGE: &str = "User with this email already exists";
pub const REGISTERED_MESSAGE: &str = "User registered successfully";

const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserSummary,
    pub message: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("reCAPTCHA verification failed. Please try again.")]
    Verification(VerdictDetails),
    #[error("{0}")]
    Invalid(&'static str),
    #[error("User with this email already exists")]
    EmailTaken,
    #[error("{0}")]
    Store(StoreError),
    #[error("failed to hash password: {0}")]
    Hash(String),
}

impl From<StoreError> for RegisterError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => RegisterError::EmailTaken,
            other @ StoreError::Unavailable(_) => RegisterError::Store(other),
        }
    }
}

impl RegisterError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Verification(_) | Self::Invalid(_) | Self::EmailTaken => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let body = match self {
            Self::Verification(details) => serde_json::json!({
                "message": message,
                "recaptchaDetails": details,
            }),
            _ => serde_json::json!({ "message": message }),
        };
        (status, Json(body)).into_response()
    }
}

/// Field checks matching the user model's constraints.
pub fn validate(request: &RegisterRequest) -> Result<(), RegisterError> {
    if request.name.trim().is_empty() {
        return Err(RegisterError::Invalid("Please provide a name"));
    }
    if request.email.trim().is_empty() {
        return Err(RegisterError::Invalid("Please provide an email"));
    }
    if !EMAIL_PATTERN.is_match(request.email.trim()) {
        return Err(RegisterError::Invalid("Please provide a valid email"));
    }
    if request.password.is_empty() {
        return Err(RegisterError::Invalid("Please provide a password"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RegisterError::Invalid(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), RegisterError> {
    let verdict = state
        .verifier()
        .verify(state.policy(), request.recaptcha_token.as_deref())
        .await;
    if !verdict.success() {
        tracing::warn!(
            verdict = %verdict.kind(),
            operator_fault = verdict.kind().is_operator_fault(),
            reason = verdict.message(),
            "Registration rejected by reCAPTCHA gate"
        );
        return Err(RegisterError::Verification(verdict.into_details()));
    }

    validate(&request)?;

    let RegisterRequest {
        name,
        email,
        password,
        ..
    } = request;
    let name = name.trim().to_string();
    let email = email.trim().to_string();

    if state.users().find_by_email(&email)?.is_some() {
        return Err(RegisterError::EmailTaken);
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| RegisterError::Hash(e.to_string()))?
        .map_err(|e| RegisterError::Hash(e.to_string()))?;

    let user = state
        .users()
        .insert(NewUser {
            name,
            email,
            password_hash,
        })
        .inspect_err(|e| tracing::error!(error = %e, "Failed to create user"))?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.summary(),
            message: REGISTERED_MESSAGE,
        }),
    ))
}
