use std::fmt;

use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

/// User-facing message when no safer classification exists.
pub const MSG_GENERIC_FAILURE: &str = "登录失败，请稍后重试";

/// User-facing message for account/password problems.
pub const MSG_BAD_ACCOUNT_OR_PASSWORD: &str = "账号或密码错误，请重试";

/// User-facing message for verification-code problems.
pub const MSG_BAD_OR_EXPIRED_CODE: &str = "验证码错误或已过期，请重试";

/// Which credential method a login attempt used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    Password,
    Sms,
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMethod::Password => write!(f, "password"),
            LoginMethod::Sms => write!(f, "sms"),
        }
    }
}

/// Failures surfaced by `login` and `refresh`.
///
/// The `Display` text is diagnostic only and may name internals; anything
/// shown to a person goes through [`AuthError::user_message`], which
/// normalizes every variant to one of the fixed user-facing strings.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("phone number is required")]
    InvalidCredentials,

    #[error("account is not eligible to sign in")]
    AccountNotEligible,

    #[error("password is shorter than the minimum length")]
    WeakCredentialFormat,

    #[error("verification code is not exactly six characters")]
    InvalidCredentialFormat,

    #[error("{0} credential did not match")]
    CredentialMismatch(LoginMethod),

    #[error("either a password or an sms code is required")]
    MissingCredentialMethod,

    #[error("session has no refresh token")]
    NoRefreshToken,

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("authentication service error: {0}")]
    Service(#[from] ApiError),
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::Service(ApiError::InvalidPayload(e))
    }
}

impl AuthError {
    /// The string shown to the user for this failure.
    ///
    /// Internal diagnostic detail (backend text, store errors, transport
    /// errors) never leaks through here.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::AccountNotEligible
            | AuthError::WeakCredentialFormat
            | AuthError::CredentialMismatch(LoginMethod::Password) => MSG_BAD_ACCOUNT_OR_PASSWORD,

            AuthError::InvalidCredentialFormat
            | AuthError::CredentialMismatch(LoginMethod::Sms) => MSG_BAD_OR_EXPIRED_CODE,

            AuthError::InvalidCredentials
            | AuthError::MissingCredentialMethod
            | AuthError::NoRefreshToken
            | AuthError::StoreUnavailable(_)
            | AuthError::Service(_) => MSG_GENERIC_FAILURE,
        }
    }
}
