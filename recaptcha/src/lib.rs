//! reCAPTCHA verification gate for registration.
//!
//! # Architecture
//!
//! - [`policy`] - Resolves [`PolicyConfig`] from `ENABLE_RECAPTCHA` / `RECAPTCHA_SECRET_KEY`
//! - [`client`] - `siteverify` transport ([`HttpTransport`] over `reqwest`)
//! - [`evaluate`] - Pure mapping from [`ProviderResponse`] to [`VerificationVerdict`]
//! - [`Verifier`] - The decision sequence tying the three together
//!
//! # Decision Sequence
//!
//! Exactly one verdict per call, no retries:
//!
//! | Step | Condition | Verdict |
//! |------|-----------|---------|
//! | 1 | policy disabled | pass, `Disabled` |
//! | 2 | token absent or empty | fail, `MissingToken` |
//! | 3 | secret key absent | fail, `MisconfiguredServer` |
//! | 4 | transport error, timeout, bad status, bad JSON | fail, `ProviderUnreachable` |
//! | 5 | provider reply | see [`evaluate`] |
//!
//! Steps 1-3 never touch the network.
//!
//! # Error Handling
//!
//! Nothing escapes as `Err`. Every branch becomes a [`VerificationVerdict`] whose
//! [`VerdictKind`] tells an operator error apart from a bot signal.

pub mod client;
pub mod evaluate;
pub mod policy;

pub use client::{
    ClientBuildError, ClientSettings, HttpTransport, SITEVERIFY_URL, SiteVerifyTransport,
    TransportError,
};
pub use crew_types::{
    DEFAULT_MIN_SCORE, PolicyConfig, ProviderResponse, SecretKey, VerdictDetails, VerdictKind,
    VerificationVerdict,
};
pub use evaluate::evaluate;

pub(crate) const DISABLED_MESSAGE: &str =
    "reCAPTCHA verification skipped - disabled in environment";
pub(crate) const MISSING_TOKEN_MESSAGE: &str = "reCAPTCHA verification failed: no token provided";
pub(crate) const MISSING_SECRET_MESSAGE: &str = "reCAPTCHA secret key not configured";

/// Runs the verification sequence against a transport.
#[derive(Debug, Clone)]
pub struct Verifier<T = HttpTransport> {
    transport: T,
}

impl Verifier<HttpTransport> {
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientBuildError> {
        Ok(Self::new(HttpTransport::new(settings)?))
    }
}

impl<T: SiteVerifyTransport> Verifier<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn verify(&self, policy: &PolicyConfig, token: Option<&str>) -> VerificationVerdict {
        if !policy.enabled {
            tracing::info!(verdict = %VerdictKind::Disabled, "reCAPTCHA verification skipped");
            return VerificationVerdict::new(
                VerdictKind::Disabled,
                VerdictDetails::message(DISABLED_MESSAGE),
            );
        }

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            tracing::debug!(verdict = %VerdictKind::MissingToken, "No reCAPTCHA token");
            return VerificationVerdict::new(
                VerdictKind::MissingToken,
                VerdictDetails::message(MISSING_TOKEN_MESSAGE),
            );
        };

        let Some(secret) = policy.secret_key.as_ref() else {
            // Operator error: alarm on this, it rejects every registration.
            tracing::error!(
                verdict = %VerdictKind::MisconfiguredServer,
                operator_fault = true,
                "reCAPTCHA secret key not configured; rejecting registration"
            );
            return VerificationVerdict::new(
                VerdictKind::MisconfiguredServer,
                VerdictDetails::message(MISSING_SECRET_MESSAGE),
            );
        };

        let response = match self.transport.post_form(secret, token).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    verdict = %VerdictKind::ProviderUnreachable,
                    operator_fault = true,
                    "reCAPTCHA verification request failed"
                );
                return VerificationVerdict::new(
                    VerdictKind::ProviderUnreachable,
                    VerdictDetails::message(format!("reCAPTCHA verification error: {e}")),
                );
            }
        };

        tracing::debug!(
            success = response.success,
            score = ?response.score,
            action = ?response.action,
            hostname = ?response.hostname,
            error_codes = ?response.error_codes,
            "reCAPTCHA provider response"
        );

        let verdict = evaluate(response, policy.min_score);
        if verdict.success() {
            tracing::debug!(verdict = %verdict.kind(), score = ?verdict.details().score, "reCAPTCHA passed");
        } else {
            tracing::info!(
                verdict = %verdict.kind(),
                score = ?verdict.details().score,
                errors = ?verdict.details().errors,
                "reCAPTCHA rejected registration"
            );
        }
        verdict
    }
}
