//! Policy resolution and start-up configuration tests

use crew_config::CrewConfig;
use crew_recaptcha::policy::{ENABLE_FLAG_VAR, SECRET_KEY_VAR, resolve_from_env, resolve_with};
use crew_recaptcha::{PolicyConfig, VerdictKind, Verifier};

use crate::common::{mount_score, start_provider_mock, verifier_for};

// The only test in this binary that touches these variables.
#[test]
fn resolves_from_process_environment() {
    unsafe {
        std::env::set_var(ENABLE_FLAG_VAR, "FALSE");
        std::env::set_var(SECRET_KEY_VAR, "from-env");
    }
    let disabled = resolve_from_env();
    assert!(!disabled.enabled);
    assert_eq!(
        disabled.secret_key.as_ref().map(|k| k.expose_secret()),
        Some("from-env")
    );

    unsafe {
        std::env::remove_var(ENABLE_FLAG_VAR);
        std::env::remove_var(SECRET_KEY_VAR);
    }
    let enabled = resolve_from_env();
    assert!(enabled.enabled);
    assert!(enabled.secret_key.is_none());
}

#[tokio::test]
async fn disabled_flag_passes_every_token() {
    let provider = start_provider_mock().await;
    let verifier = verifier_for(&provider);
    let policy = resolve_with(|name| (name == ENABLE_FLAG_VAR).then(|| "False".to_string()));

    for token in [None, Some(""), Some("anything")] {
        let verdict = verifier.verify(&policy, token).await;
        assert!(verdict.success());
        assert_eq!(verdict.kind(), VerdictKind::Disabled);
    }
    assert!(provider.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn identical_inputs_give_identical_verdicts() {
    let provider = start_provider_mock().await;
    mount_score(&provider, 0.5).await;
    let verifier = verifier_for(&provider);
    let policy = PolicyConfig::enabled_with_secret("test-secret-key");

    let first = verifier.verify(&policy, Some("token")).await;
    let second = verifier.verify(&policy, Some("token")).await;
    assert_eq!(first, second);
    assert_eq!(provider.received_requests().await.unwrap().len(), 2);
}

#[test]
fn default_config_builds_production_verifier() {
    let config = CrewConfig::default();
    let verifier = Verifier::from_settings(&config.client_settings()).unwrap();
    assert_eq!(
        verifier.transport().endpoint().as_str(),
        crew_recaptcha::SITEVERIFY_URL
    );
}
