//! Core domain types for Crew.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application: the reCAPTCHA
//! verifier produces these types, the registration server consumes them.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod verdict;
pub use verdict::{VerdictDetails, VerdictKind, VerificationVerdict};

use serde::Deserialize;

/// Minimum reCAPTCHA v3 score accepted as human. Inclusive.
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

// ============================================================================
// Secret Key
// ============================================================================

/// Server-side reCAPTCHA secret.
///
/// Note: `Debug` is manually implemented to redact the key value, preventing accidental
/// credential disclosure in logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

impl SecretKey {
    /// Returns `None` for an empty value; an empty secret can never authenticate.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() { None } else { Some(Self(value)) }
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Policy Configuration
// ============================================================================

/// Resolved verification policy.
///
/// Built once at process start (or injected directly in tests) and passed
/// explicitly to every verification call.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    pub enabled: bool,
    pub secret_key: Option<SecretKey>,
    pub min_score: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_key: None,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl PolicyConfig {
    #[must_use]
    pub fn enabled_with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret_key: SecretKey::new(secret),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

// ============================================================================
// Provider Response
// ============================================================================

/// Raw `siteverify` reply.
///
/// Only the fields the verdict consumes are modelled; anything else the provider
/// sends (`challenge_ts`, ...) is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub success: bool,
    /// Present only for score-based (v3) keys.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}
