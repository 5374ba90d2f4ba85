//! Verification verdicts.

use serde::Serialize;

/// Which branch of the verification sequence produced a verdict.
///
/// Not part of the wire shape; callers use it for logging and for telling an
/// operator error apart from a bot signal without reading the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictKind {
    /// Verification switched off in the environment.
    Disabled,
    Verified,
    /// Client supplied no token.
    MissingToken,
    /// No secret key configured. Operator error, not a bot signal.
    MisconfiguredServer,
    /// Transport, timeout, status or parse failure talking to the provider.
    ProviderUnreachable,
    /// Score below the threshold.
    LowConfidence,
    /// Provider said no.
    ProviderRejected,
}

impl VerdictKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Verified => "verified",
            Self::MissingToken => "missing_token",
            Self::MisconfiguredServer => "misconfigured_server",
            Self::ProviderUnreachable => "provider_unreachable",
            Self::LowConfidence => "low_confidence",
            Self::ProviderRejected => "provider_rejected",
        }
    }

    /// Whether a verdict of this kind lets the caller proceed.
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Disabled | Self::Verified)
    }

    /// Failures caused by the deployment rather than the client. Every
    /// registration fails until an operator intervenes.
    #[must_use]
    pub const fn is_operator_fault(self) -> bool {
        matches!(self, Self::MisconfiguredServer | Self::ProviderUnreachable)
    }
}

impl std::fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic detail attached to every verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictDetails {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl VerdictDetails {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            score: None,
            threshold: None,
            errors: None,
            hostname: None,
            action: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: Option<String>) -> Self {
        self.action = action;
        self
    }
}

/// Outcome of one verification call.
///
/// `success` is derived from the kind, so a passing verdict can never carry a
/// failure kind or the reverse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationVerdict {
    success: bool,
    details: VerdictDetails,
    #[serde(skip)]
    kind: VerdictKind,
}

impl VerificationVerdict {
    #[must_use]
    pub fn new(kind: VerdictKind, details: VerdictDetails) -> Self {
        Self {
            success: kind.is_pass(),
            details,
            kind,
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub const fn kind(&self) -> VerdictKind {
        self.kind
    }

    #[must_use]
    pub fn details(&self) -> &VerdictDetails {
        &self.details
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.details.message
    }

    #[must_use]
    pub fn into_details(self) -> VerdictDetails {
        self.details
    }
}
