//! Unit tests for session configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;
use std::time::Duration;

fn mock_env(vars: HashMap<String, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_defaults() -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert(COOKIE_SECURE_ENV.to_string(), "1".to_string());
    vars.insert(SAMESITE_ENV.to_string(), "Strict".to_string());
    vars
}

fn with_var(mut vars: HashMap<String, String>, name: &str, value: &str) -> HashMap<String, String> {
    vars.insert(name.to_string(), value.to_string());
    vars
}

fn expect_error(
    result: Result<SessionSettings, SessionConfigError>,
    label: &str,
) -> SessionConfigError {
    match result {
        Ok(_) => panic!("{label}"),
        Err(error) => error,
    }
}

#[rstest]
fn release_missing_cookie_secure_is_rejected() {
    let mut vars = release_defaults();
    vars.remove(COOKIE_SECURE_ENV);
    let err = expect_error(
        session_settings_from_env(&mock_env(vars), BuildMode::Release),
        "expected missing cookie secure to fail",
    );
    assert!(matches!(
        err,
        SessionConfigError::MissingEnv {
            name: COOKIE_SECURE_ENV
        }
    ));
}

#[rstest]
#[case("maybe")]
#[case("")]
fn release_invalid_cookie_secure_is_rejected(#[case] value: &str) {
    let env = mock_env(with_var(release_defaults(), COOKIE_SECURE_ENV, value));
    let err = expect_error(
        session_settings_from_env(&env, BuildMode::Release),
        "expected invalid cookie secure to fail",
    );
    assert!(matches!(
        err,
        SessionConfigError::InvalidEnv {
            name: COOKIE_SECURE_ENV,
            ..
        }
    ));
}

#[rstest]
fn release_missing_same_site_is_rejected() {
    let mut vars = release_defaults();
    vars.remove(SAMESITE_ENV);
    let err = expect_error(
        session_settings_from_env(&mock_env(vars), BuildMode::Release),
        "expected missing SameSite to fail",
    );
    assert!(matches!(
        err,
        SessionConfigError::MissingEnv { name: SAMESITE_ENV }
    ));
}

#[rstest]
fn release_insecure_none_same_site_is_rejected() {
    let vars = with_var(release_defaults(), COOKIE_SECURE_ENV, "0");
    let env = mock_env(with_var(vars, SAMESITE_ENV, "None"));
    let err = expect_error(
        session_settings_from_env(&env, BuildMode::Release),
        "expected SameSite=None without Secure to fail",
    );
    assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn release_valid_settings_use_default_expiry() {
    let settings = session_settings_from_env(&mock_env(release_defaults()), BuildMode::Release)
        .expect("valid settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.policy, ExpiryPolicy::default());
    assert!(!settings.revoke_channels_on_logout);
}

#[rstest]
fn expiry_windows_are_read_in_seconds() {
    let vars = with_var(release_defaults(), IDLE_TIMEOUT_ENV, "600");
    let env = mock_env(with_var(vars, ABSOLUTE_LIFETIME_ENV, "3600"));
    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");
    assert_eq!(settings.policy.idle(), Duration::from_secs(600));
    assert_eq!(settings.policy.absolute(), Duration::from_secs(3600));
}

#[rstest]
fn idle_longer_than_lifetime_is_rejected_in_every_mode() {
    let vars = with_var(release_defaults(), IDLE_TIMEOUT_ENV, "7200");
    let vars = with_var(vars, ABSOLUTE_LIFETIME_ENV, "3600");
    for mode in [BuildMode::Debug, BuildMode::Release] {
        let err = expect_error(
            session_settings_from_env(&mock_env(vars.clone()), mode),
            "expected inverted expiry windows to fail",
        );
        assert!(matches!(
            err,
            SessionConfigError::InvalidExpiry(ExpiryPolicyError::IdleExceedsAbsolute)
        ));
    }
}

#[rstest]
fn oversized_expiry_windows_are_rejected() {
    let vars = with_var(release_defaults(), IDLE_TIMEOUT_ENV, "1000000000000000");
    let vars = with_var(vars, ABSOLUTE_LIFETIME_ENV, "1000000000000000");
    let err = expect_error(
        session_settings_from_env(&mock_env(vars), BuildMode::Release),
        "expected oversized expiry windows to fail",
    );
    assert!(matches!(
        err,
        SessionConfigError::InvalidExpiry(ExpiryPolicyError::OutOfRange)
    ));
}

#[rstest]
#[case("0")]
#[case("-5")]
#[case("two hours")]
fn release_malformed_idle_timeout_is_rejected(#[case] value: &str) {
    let env = mock_env(with_var(release_defaults(), IDLE_TIMEOUT_ENV, value));
    let err = expect_error(
        session_settings_from_env(&env, BuildMode::Release),
        "expected malformed idle timeout to fail",
    );
    assert!(matches!(
        err,
        SessionConfigError::InvalidEnv {
            name: IDLE_TIMEOUT_ENV,
            ..
        }
    ));
}

#[rstest]
#[case("1", true)]
#[case("yes", true)]
#[case("0", false)]
fn revocation_toggle_is_parsed(#[case] value: &str, #[case] expected: bool) {
    let env = mock_env(with_var(release_defaults(), REVOKE_CHANNELS_ENV, value));
    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");
    assert_eq!(settings.revoke_channels_on_logout, expected);
}

#[rstest]
fn release_invalid_revocation_toggle_is_rejected() {
    let env = mock_env(with_var(release_defaults(), REVOKE_CHANNELS_ENV, "sometimes"));
    let err = expect_error(
        session_settings_from_env(&env, BuildMode::Release),
        "expected invalid revocation toggle to fail",
    );
    assert!(matches!(
        err,
        SessionConfigError::InvalidEnv {
            name: REVOKE_CHANNELS_ENV,
            ..
        }
    ));
}

#[rstest]
fn debug_defaults_fill_missing_toggles() {
    let settings =
        session_settings_from_env(&mock_env(HashMap::new()), BuildMode::Debug).expect("defaults");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
    assert_eq!(settings.policy, ExpiryPolicy::default());
}

#[rstest]
fn debug_invalid_values_fall_back_to_defaults() {
    let vars = with_var(HashMap::new(), SAMESITE_ENV, "sideways");
    let vars = with_var(vars, IDLE_TIMEOUT_ENV, "soon");
    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("defaults");
    assert_eq!(settings.same_site, SameSite::Lax);
    assert_eq!(settings.policy.idle(), ExpiryPolicy::DEFAULT_IDLE);
}
