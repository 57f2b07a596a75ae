//! Remote authentication API client.
//!
//! This is the production `AccountVerifier`: credential exchanges are JSON
//! POSTs against the deployed authentication service. The lifecycle
//! controller never sees transport detail - everything surfaces as the
//! typed `AuthError` taxonomy.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::error::{AuthError, LoginMethod};
use crate::auth::verifier::{AccountVerifier, SessionGrant};
use crate::models::UserRecord;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow mobile networks while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client type reported to the backend in login requests.
const CLIENT_TYPE: &str = "app";

/// Advisory token lifetime assumed when the backend omits `expiresIn`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Extra attempts for a failed refresh exchange.
/// The refresh call is the one exchange worth retrying: losing it logs the
/// user out, and transient network blips are common on mobile.
const MAX_REFRESH_RETRIES: u32 = 2;

/// Delay before the first refresh retry, growing linearly per attempt.
const REFRESH_RETRY_BASE_MS: u64 = 1000;

const PASSWORD_LOGIN_PATH: &str = "/auth/login/password";
const SMS_LOGIN_PATH: &str = "/auth/login/sms";
const REFRESH_PATH: &str = "/auth/token/refresh";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordLoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    client_type: &'a str,
    device_id: &'a str,
    remember_me: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SmsLoginRequest<'a> {
    mobile: &'a str,
    sms_code: &'a str,
    client_type: &'a str,
    device_id: &'a str,
    remember_me: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Standard response envelope used by every auth endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    message: Option<String>,
    data: Option<GrantData>,
}

#[derive(Debug, Deserialize)]
struct GrantData {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    #[serde(rename = "expiresIn")]
    expires_in: Option<u64>,
    #[serde(rename = "userInfo")]
    user_info: Option<BackendUser>,
}

impl GrantData {
    fn into_grant(self, fallback_phone: &str) -> SessionGrant {
        SessionGrant {
            user: self.user_info.map(|u| u.into_record(fallback_phone)),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        }
    }
}

/// User payload as the backend models it; adapted to `UserRecord` before it
/// reaches the session.
#[derive(Debug, Deserialize)]
struct BackendUser {
    id: i64,
    mobile: Option<String>,
    nickname: Option<String>,
    username: Option<String>,
    avatar: Option<String>,
    status: Option<i64>,
}

impl BackendUser {
    fn into_record(self, fallback_phone: &str) -> UserRecord {
        UserRecord {
            id: self.id.to_string(),
            phone: self.mobile.unwrap_or_else(|| fallback_phone.to_string()),
            nickname: self.nickname.or(self.username).unwrap_or_default(),
            avatar: self.avatar,
            // The backend encodes verification as status == 1.
            verified: self.status == Some(1),
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Auth API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthApiClient {
    client: Client,
    base_url: String,
}

impl AuthApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post_grant<B: Serialize>(&self, path: &str, body: &B) -> Result<GrantData, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(path, status = %status, "Auth exchange response received");

        if !status.is_success() {
            return Err(ApiError::from_status(status, &text));
        }

        let envelope: Envelope = serde_json::from_str(&text)?;
        if !envelope.success {
            return Err(ApiError::Rejected(
                envelope.message.unwrap_or_else(|| "exchange rejected".to_string()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::UnexpectedResponse("envelope carried no data".to_string()))
    }
}

/// Map a failed credential exchange onto the session error taxonomy.
///
/// A 401 or an in-envelope rejection means the credential itself was wrong;
/// a 403 means the account may not sign in at all. Everything else is a
/// service-level failure.
fn map_exchange_error(e: ApiError, method: LoginMethod) -> AuthError {
    match e {
        ApiError::Unauthorized | ApiError::Rejected(_) => AuthError::CredentialMismatch(method),
        ApiError::Forbidden(_) => AuthError::AccountNotEligible,
        other => AuthError::Service(other),
    }
}

#[async_trait]
impl AccountVerifier for AuthApiClient {
    async fn check_eligibility(&self, _phone: &str) -> Result<(), AuthError> {
        // Eligibility is the backend's decision; it answers during the
        // exchange (403 surfaces as AccountNotEligible there).
        Ok(())
    }

    async fn exchange_password(
        &self,
        phone: &str,
        password: &str,
        device_id: &str,
    ) -> Result<SessionGrant, AuthError> {
        let body = PasswordLoginRequest {
            // The backend takes the phone number in its username field.
            username: phone,
            password,
            client_type: CLIENT_TYPE,
            device_id,
            remember_me: false,
        };
        self.post_grant(PASSWORD_LOGIN_PATH, &body)
            .await
            .map(|data| data.into_grant(phone))
            .map_err(|e| map_exchange_error(e, LoginMethod::Password))
    }

    async fn exchange_sms(
        &self,
        phone: &str,
        code: &str,
        device_id: &str,
    ) -> Result<SessionGrant, AuthError> {
        let body = SmsLoginRequest {
            mobile: phone,
            sms_code: code,
            client_type: CLIENT_TYPE,
            device_id,
            remember_me: false,
        };
        self.post_grant(SMS_LOGIN_PATH, &body)
            .await
            .map(|data| data.into_grant(phone))
            .map_err(|e| map_exchange_error(e, LoginMethod::Sms))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionGrant, AuthError> {
        let mut attempt: u32 = 0;
        loop {
            match self.post_grant(REFRESH_PATH, &RefreshRequest { refresh_token }).await {
                Ok(data) => return Ok(data.into_grant("")),
                Err(e) if attempt < MAX_REFRESH_RETRIES && e.is_retryable() => {
                    attempt += 1;
                    warn!(attempt, error = %e, "Refresh exchange failed, retrying");
                    tokio::time::sleep(Duration::from_millis(
                        REFRESH_RETRY_BASE_MS * u64::from(attempt),
                    ))
                    .await;
                }
                Err(e) => return Err(AuthError::Service(e)),
            }
        }
    }
}
