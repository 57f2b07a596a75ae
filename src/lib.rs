//! session-kit - client-side authentication session lifecycle.
//!
//! The crate owns three layers:
//!
//! - `store`: two-tier credential persistence (OS keychain with a
//!   plaintext-file fallback) for the access token, refresh token, and
//!   cached user record
//! - `auth`: the in-memory session state and the `SessionManager`
//!   lifecycle controller that is its only mutator
//! - `api`: the remote authentication client, one of two `AccountVerifier`
//!   implementations (the other is a fixed allow-list for test builds)
//!
//! A host application constructs one `SessionManager` at startup, calls
//! `initialize()` to restore any persisted session, and drives
//! `login`/`logout`/`refresh` from its UI. Read-only selectors never block
//! on in-flight mutators.
//!
//! ```no_run
//! use session_kit::{AllowListVerifier, AuthConfig, Credentials, SessionManager};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AuthConfig::load()?;
//! let manager = SessionManager::open(&config, Box::new(AllowListVerifier::with_test_accounts()))?;
//!
//! manager.initialize().await;
//! if !manager.is_authenticated() {
//!     if let Err(e) = manager.login(Credentials::password_login("13800138000", "test123456")).await {
//!         eprintln!("{}", e.user_message());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiError, AuthApiClient};
pub use auth::{
    AccountVerifier, AllowListAccount, AllowListVerifier, AuthError, Credentials, LoginMethod,
    LoginMode, SessionGrant, SessionManager, SessionState,
};
pub use config::AuthConfig;
pub use models::UserRecord;
pub use store::{CredentialKey, CredentialStore, SecureBackend, StoreError};
