//! Turns a provider reply into a verdict.
//!
//! The presence of `score`, not the provider's `success` flag, selects the
//! branch: v3 keys always report a score for valid tokens and the score is the
//! real signal.

use crate::{ProviderResponse, VerdictDetails, VerdictKind, VerificationVerdict};

pub(crate) const VERIFIED_MESSAGE: &str = "reCAPTCHA verification successful";
pub(crate) const REJECTED_MESSAGE: &str =
    "reCAPTCHA verification failed: provider rejected the token";

#[must_use]
pub fn evaluate(response: ProviderResponse, min_score: f64) -> VerificationVerdict {
    let ProviderResponse {
        success,
        score,
        action,
        hostname,
        error_codes,
    } = response;

    let Some(score) = score else {
        if !success {
            return VerificationVerdict::new(
                VerdictKind::ProviderRejected,
                VerdictDetails::message(REJECTED_MESSAGE)
                    .with_errors(error_codes)
                    .with_hostname(hostname),
            );
        }
        return VerificationVerdict::new(
            VerdictKind::Verified,
            VerdictDetails::message(VERIFIED_MESSAGE).with_hostname(hostname),
        );
    };

    if score < min_score {
        return VerificationVerdict::new(
            VerdictKind::LowConfidence,
            VerdictDetails::message(format!(
                "reCAPTCHA score too low: {score} is below the threshold of {min_score}"
            ))
            .with_score(score)
            .with_threshold(min_score)
            .with_errors(error_codes)
            .with_hostname(hostname)
            .with_action(action),
        );
    }

    if !success {
        // Scored but flagged unsuccessful: keep the score for diagnosis.
        return VerificationVerdict::new(
            VerdictKind::ProviderRejected,
            VerdictDetails::message(REJECTED_MESSAGE)
                .with_score(score)
                .with_errors(error_codes)
                .with_hostname(hostname)
                .with_action(action),
        );
    }

    VerificationVerdict::new(
        VerdictKind::Verified,
        VerdictDetails::message(VERIFIED_MESSAGE)
            .with_score(score)
            .with_hostname(hostname)
            .with_action(action),
    )
}
