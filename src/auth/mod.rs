//! Authentication session lifecycle.
//!
//! This module provides:
//! - `SessionManager`: the lifecycle controller and sole mutator of session
//!   state (`initialize`/`login`/`logout`/`refresh` and the setters)
//! - `SessionState`/`LoginMode`: the in-memory authoritative session view
//! - `AccountVerifier`: the seam to whatever verifies credentials, with
//!   `AllowListVerifier` as the fixed test-account implementation
//! - `AuthError`: the typed failure taxonomy with user-safe messages

pub mod error;
pub mod manager;
pub mod session;
pub mod verifier;

pub use error::{AuthError, LoginMethod};
pub use manager::SessionManager;
pub use session::{generate_device_id, LoginMode, SessionState};
pub use verifier::{AccountVerifier, AllowListAccount, AllowListVerifier, Credentials, SessionGrant};
