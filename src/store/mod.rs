//! Credential persistence for the authentication session.
//!
//! This module provides:
//! - `SecureBackend`: the key-value contract a storage tier implements
//! - `KeyringBackend`: OS keychain storage (primary tier)
//! - `FileBackend`: plaintext JSON storage (fallback tier)
//! - `MemoryBackend`: in-process storage for tests and ephemeral sessions
//! - `CredentialStore`: the two-tier strategy that retries a failed primary
//!   operation once against the fallback
//!
//! The fallback tier offers no protection beyond filesystem permissions, so
//! every degradation to it is logged.

pub mod file;
pub mod keyring;
pub mod memory;

use std::fmt;

use anyhow::Result;
use thiserror::Error;
use tracing::warn;

use crate::config::AuthConfig;

pub use self::file::FileBackend;
pub use self::keyring::KeyringBackend;
pub use self::memory::MemoryBackend;

/// The three credential entries owned by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    UserCredentials,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::UserCredentials,
    ];

    /// Key name used by every backend.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "ACCESS_TOKEN",
            CredentialKey::RefreshToken => "REFRESH_TOKEN",
            CredentialKey::UserCredentials => "USER_CREDENTIALS",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Both storage tiers failed for one operation.
///
/// Single-tier failures are handled inside `CredentialStore` by degrading to
/// the fallback; callers only ever see this error when neither tier could
/// complete the operation.
#[derive(Debug, Error)]
#[error(
    "credential store unavailable for {key}: {primary_backend}: {primary}; {fallback_backend}: {fallback}"
)]
pub struct StoreError {
    key: &'static str,
    primary_backend: &'static str,
    primary: String,
    fallback_backend: &'static str,
    fallback: String,
}

/// Key-value contract implemented by each storage tier.
///
/// `get` distinguishes "no entry" (`Ok(None)`) from a backend failure;
/// `delete` of a missing entry is not an error.
pub trait SecureBackend: Send + Sync {
    /// Short backend label used in diagnostics ("keyring", "file", ...).
    fn name(&self) -> &'static str;

    fn set(&self, key: CredentialKey, value: &str) -> Result<()>;
    fn get(&self, key: CredentialKey) -> Result<Option<String>>;
    fn delete(&self, key: CredentialKey) -> Result<()>;
}

/// Two-tier credential storage: try the primary secure backend, retry once
/// against the fallback if it fails.
pub struct CredentialStore {
    primary: Box<dyn SecureBackend>,
    fallback: Box<dyn SecureBackend>,
}

impl CredentialStore {
    pub fn new(primary: Box<dyn SecureBackend>, fallback: Box<dyn SecureBackend>) -> Self {
        Self { primary, fallback }
    }

    /// Build the production store: OS keychain with a JSON-file fallback at
    /// the configured location.
    pub fn open(config: &AuthConfig) -> Result<Self> {
        Ok(Self::new(
            Box::new(KeyringBackend::new(config.service_name.clone())),
            Box::new(FileBackend::new(config.fallback_store_path()?)),
        ))
    }

    pub fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        match self.primary.set(key, value) {
            Ok(()) => Ok(()),
            Err(primary) => {
                warn!(
                    key = %key,
                    backend = self.primary.name(),
                    error = %primary,
                    "primary credential write failed, degrading to fallback"
                );
                self.fallback
                    .set(key, value)
                    .map_err(|fallback| self.both_failed(key, &primary, &fallback))
            }
        }
    }

    pub fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
        match self.primary.get(key) {
            Ok(value) => Ok(value),
            Err(primary) => {
                warn!(
                    key = %key,
                    backend = self.primary.name(),
                    error = %primary,
                    "primary credential read failed, degrading to fallback"
                );
                self.fallback
                    .get(key)
                    .map_err(|fallback| self.both_failed(key, &primary, &fallback))
            }
        }
    }

    /// Delete an entry from both tiers.
    ///
    /// The fallback is swept even when the primary delete succeeds: an
    /// earlier degraded write may have left an entry there, and that copy
    /// must not outlive the credential.
    pub fn delete(&self, key: CredentialKey) -> Result<(), StoreError> {
        let primary = self.primary.delete(key).err();
        if let Some(ref e) = primary {
            warn!(
                key = %key,
                backend = self.primary.name(),
                error = %e,
                "primary credential delete failed, sweeping fallback anyway"
            );
        }
        let fallback = self.fallback.delete(key).err();
        match (primary, fallback) {
            (Some(p), Some(f)) => Err(self.both_failed(key, &p, &f)),
            _ => Ok(()),
        }
    }

    fn both_failed(
        &self,
        key: CredentialKey,
        primary: &anyhow::Error,
        fallback: &anyhow::Error,
    ) -> StoreError {
        StoreError {
            key: key.storage_key(),
            primary_backend: self.primary.name(),
            primary: format!("{primary:#}"),
            fallback_backend: self.fallback.name(),
            fallback: format!("{fallback:#}"),
        }
    }
}
