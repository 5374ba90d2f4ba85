//! Resolves the verification policy from environment variables.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `ENABLE_RECAPTCHA` | `"false"` (any case) disables verification; anything else, or unset, enables it |
//! | `RECAPTCHA_SECRET_KEY` | Secret sent to the provider; unset or empty means misconfigured |
//!
//! Resolution never fails. A missing value is itself a valid resolved state.

use std::env;

use crate::PolicyConfig;
use crew_types::SecretKey;

pub const ENABLE_FLAG_VAR: &str = "ENABLE_RECAPTCHA";
pub const SECRET_KEY_VAR: &str = "RECAPTCHA_SECRET_KEY";

/// Resolve the policy from the process environment.
#[must_use]
pub fn resolve_from_env() -> PolicyConfig {
    resolve_with(|name| env::var(name).ok())
}

/// Resolve the policy from an arbitrary variable lookup.
pub fn resolve_with<F>(lookup: F) -> PolicyConfig
where
    F: Fn(&str) -> Option<String>,
{
    // Fail-open: only an explicit "false" turns verification off.
    let enabled = !lookup(ENABLE_FLAG_VAR).is_some_and(|flag| flag.to_lowercase() == "false");
    let secret_key = lookup(SECRET_KEY_VAR).and_then(SecretKey::new);

    PolicyConfig {
        enabled,
        secret_key,
        ..PolicyConfig::default()
    }
}
