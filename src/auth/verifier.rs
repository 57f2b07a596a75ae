use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

use crate::auth::error::{AuthError, LoginMethod};
use crate::models::UserRecord;

/// Advisory lifetime of tokens issued by the allow-list verifier.
const GRANT_TTL_SECS: u64 = 3600;

/// Length of the random suffix appended to synthesized tokens, so two
/// logins in the same millisecond still get distinct tokens.
const TOKEN_SUFFIX_LEN: usize = 6;

/// Login input accepted by the session manager.
///
/// Exactly one of `password` / `sms_code` should be supplied; the manager
/// rejects requests carrying neither.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub phone: Option<String>,
    pub password: Option<String>,
    pub sms_code: Option<String>,
}

impl Credentials {
    pub fn password_login(phone: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: Some(phone.into()),
            password: Some(password.into()),
            sms_code: None,
        }
    }

    pub fn sms_login(phone: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            phone: Some(phone.into()),
            password: None,
            sms_code: Some(code.into()),
        }
    }
}

/// Tokens and identity issued by a successful credential exchange.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Present on login; a refresh may omit it, in which case the session
    /// keeps its current user record.
    pub user: Option<UserRecord>,
    /// Advisory access-token lifetime in seconds.
    pub expires_in: u64,
}

/// Verification seam between the session manager and whatever decides if an
/// account may sign in.
///
/// Production deployments use `api::AuthApiClient`; tests and offline
/// builds use `AllowListVerifier`. Swapping implementations changes
/// eligibility policy without touching the lifecycle controller.
#[async_trait]
pub trait AccountVerifier: Send + Sync {
    /// Whether this phone number may sign in at all.
    async fn check_eligibility(&self, phone: &str) -> Result<(), AuthError>;

    async fn exchange_password(
        &self,
        phone: &str,
        password: &str,
        device_id: &str,
    ) -> Result<SessionGrant, AuthError>;

    async fn exchange_sms(
        &self,
        phone: &str,
        code: &str,
        device_id: &str,
    ) -> Result<SessionGrant, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<SessionGrant, AuthError>;
}

/// One pre-configured identity usable for login in lieu of a real backend.
#[derive(Debug, Clone)]
pub struct AllowListAccount {
    pub phone: String,
    pub password: String,
    pub sms_code: String,
    pub user: UserRecord,
}

/// Fixed allow-list verifier.
///
/// Stands in for the remote authentication API: only the configured
/// accounts may sign in, and grants are synthesized locally with tokens
/// that are unique per login but carry no cryptographic meaning.
pub struct AllowListVerifier {
    accounts: Vec<AllowListAccount>,
    latency: Duration,
}

impl AllowListVerifier {
    pub fn new(accounts: Vec<AllowListAccount>) -> Self {
        Self {
            accounts,
            latency: Duration::ZERO,
        }
    }

    /// Simulate network latency on every exchange.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The standard test-account table.
    pub fn with_test_accounts() -> Self {
        let account = |phone: &str, sms_code: &str, id: &str, nickname: &str| AllowListAccount {
            phone: phone.to_string(),
            password: "test123456".to_string(),
            sms_code: sms_code.to_string(),
            user: UserRecord {
                id: id.to_string(),
                phone: phone.to_string(),
                nickname: nickname.to_string(),
                avatar: Some(format!("https://cdn.example.com/avatar/{id}.png")),
                verified: true,
                created_at: Utc::now(),
            },
        };

        Self::new(vec![
            account("13800138000", "888888", "u_1001", "测试用户一"),
            account("13800138001", "666666", "u_1002", "测试用户二"),
            account("13800138002", "123456", "u_1003", "测试用户三"),
        ])
    }

    fn account(&self, phone: &str) -> Option<&AllowListAccount> {
        self.accounts.iter().find(|a| a.phone == phone)
    }

    fn grant_for(&self, user: Option<UserRecord>) -> SessionGrant {
        SessionGrant {
            access_token: synthesize_token("access"),
            refresh_token: synthesize_token("refresh"),
            user,
            expires_in: GRANT_TTL_SECS,
        }
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

/// `mock_{kind}_token_{unix_millis}_{random suffix}` - opaque and unique
/// per login, nothing more.
fn synthesize_token(kind: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("mock_{kind}_token_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[async_trait]
impl AccountVerifier for AllowListVerifier {
    async fn check_eligibility(&self, phone: &str) -> Result<(), AuthError> {
        self.account(phone)
            .map(|_| ())
            .ok_or(AuthError::AccountNotEligible)
    }

    async fn exchange_password(
        &self,
        phone: &str,
        password: &str,
        _device_id: &str,
    ) -> Result<SessionGrant, AuthError> {
        self.pause().await;
        let account = self.account(phone).ok_or(AuthError::AccountNotEligible)?;
        if account.password != password {
            return Err(AuthError::CredentialMismatch(LoginMethod::Password));
        }
        Ok(self.grant_for(Some(account.user.clone())))
    }

    async fn exchange_sms(
        &self,
        phone: &str,
        code: &str,
        _device_id: &str,
    ) -> Result<SessionGrant, AuthError> {
        self.pause().await;
        let account = self.account(phone).ok_or(AuthError::AccountNotEligible)?;
        if account.sms_code != code {
            return Err(AuthError::CredentialMismatch(LoginMethod::Sms));
        }
        Ok(self.grant_for(Some(account.user.clone())))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<SessionGrant, AuthError> {
        self.pause().await;
        // The mocked exchange accepts any refresh token and rotates both
        // tokens; the identity is unchanged so no user record is returned.
        Ok(self.grant_for(None))
    }
}
