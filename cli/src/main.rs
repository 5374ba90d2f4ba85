//! Crew - Binary entry point for the registration server.
//!
//! # Start-up
//!
//! ```text
//! main() -> init_tracing()
//!        -> CrewConfig::load()          (bind address, siteverify client)
//!        -> policy::resolve_from_env()  (ENABLE_RECAPTCHA, RECAPTCHA_SECRET_KEY)
//!        -> crew_server::serve()        (until Ctrl-C)
//! ```
//!
//! The verification policy is resolved once here and handed to every request;
//! changing the environment requires a restart.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crew_config::CrewConfig;
use crew_recaptcha::{PolicyConfig, Verifier, policy};
use crew_server::{AppState, MemoryUserStore};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn report_policy(policy: &PolicyConfig) {
    if !policy.enabled {
        tracing::warn!(
            env_var = policy::ENABLE_FLAG_VAR,
            "reCAPTCHA verification disabled; every registration will be accepted"
        );
    } else if policy.secret_key.is_none() {
        tracing::error!(
            env_var = policy::SECRET_KEY_VAR,
            "reCAPTCHA secret key not configured; every registration will be rejected"
        );
    } else {
        tracing::info!(min_score = policy.min_score, "reCAPTCHA verification enabled");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C; shutting down");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = match CrewConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => return Err(e).context("failed to load configuration"),
    };
    if let Some(path) = CrewConfig::path() {
        tracing::debug!(path = %path.display(), "Configuration path");
    }

    let policy = policy::resolve_from_env();
    report_policy(&policy);

    let settings = config.client_settings();
    let verifier = Verifier::from_settings(&settings).context("invalid reCAPTCHA settings")?;
    tracing::info!(
        endpoint = %verifier.transport().endpoint(),
        timeout_ms = settings.timeout.as_millis(),
        "reCAPTCHA client ready"
    );

    let state = AppState::new(verifier, policy, Arc::new(MemoryUserStore::new()));
    let listener = crew_server::bind(&config.bind_addr()).await?;
    crew_server::serve(listener, state, shutdown_signal()).await?;

    Ok(())
}
