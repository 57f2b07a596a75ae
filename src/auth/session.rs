use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::models::UserRecord;

/// Length of the random suffix in generated device ids.
/// Collision-resistant across concurrent devices, not cryptographic.
const DEVICE_ID_SUFFIX_LEN: usize = 9;

/// How many leading characters of a token may appear in logs.
const TOKEN_LOG_PREFIX_LEN: usize = 12;

/// How the user last chose to sign in. UI hint only; nothing about the
/// session's validity depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    #[default]
    Password,
    Sms,
}

/// In-memory authoritative view of the authentication session.
///
/// Invariant: `is_authenticated` is true iff `access_token` is present.
/// Mutated only by `SessionManager`; consumers read snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub is_initialized: bool,
    pub user_info: Option<UserRecord>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub login_mode: LoginMode,
    pub device_id: Option<String>,
}

/// Generate a process-lifetime device identifier:
/// `device_{unix_millis}_{random suffix}`.
pub fn generate_device_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DEVICE_ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("device_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Truncated token prefix for diagnostics. Tokens never reach logs in full.
pub fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(TOKEN_LOG_PREFIX_LEN).collect();
    if prefix.len() < token.len() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_device_ids_are_distinct() {
        let a = generate_device_id();
        let b = generate_device_id();
        assert!(a.starts_with("device_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_redact_token_truncates_long_tokens() {
        let redacted = redact_token("mock_access_token_1700000000000_a1b2c3");
        assert_eq!(redacted, "mock_access_...");
    }

    #[test]
    fn test_redact_token_keeps_short_tokens_whole() {
        assert_eq!(redact_token("short"), "short");
    }

    #[test]
    fn test_login_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LoginMode::Sms).unwrap(), "\"sms\"");
        assert_eq!(
            serde_json::from_str::<LoginMode>("\"password\"").unwrap(),
            LoginMode::Password
        );
    }
}
