use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::auth::error::AuthError;
use crate::auth::session::{generate_device_id, redact_token, LoginMode, SessionState};
use crate::auth::verifier::{AccountVerifier, Credentials, SessionGrant};
use crate::config::AuthConfig;
use crate::models::UserRecord;
use crate::store::{CredentialKey, CredentialStore};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

/// Exact length of an sms verification code.
const SMS_CODE_LEN: usize = 6;

/// The sole authorized mutator of the authentication session.
///
/// Owns the in-memory `SessionState` and mirrors every credential change
/// into the `CredentialStore` before the in-memory flip, so a process
/// restart can reconstruct an equivalent session via `initialize`.
///
/// All mutators are serialized behind one async mutex: `login`, `logout`,
/// and `refresh` are not safe to interleave (a `logout` racing a `refresh`
/// could resurrect a cleared session). Selectors take a snapshot and never
/// block on in-flight mutators.
pub struct SessionManager {
    store: CredentialStore,
    verifier: Box<dyn AccountVerifier>,
    state: RwLock<SessionState>,
    op: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: CredentialStore, verifier: Box<dyn AccountVerifier>) -> Self {
        Self {
            store,
            verifier,
            state: RwLock::new(SessionState::default()),
            op: Mutex::new(()),
        }
    }

    /// Build a manager with the production credential store described by
    /// the configuration.
    pub fn open(config: &AuthConfig, verifier: Box<dyn AccountVerifier>) -> anyhow::Result<Self> {
        Ok(Self::new(CredentialStore::open(config)?, verifier))
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated
    }

    pub fn is_initialized(&self) -> bool {
        self.read_state().is_initialized
    }

    pub fn user_info(&self) -> Option<UserRecord> {
        self.read_state().user_info.clone()
    }

    pub fn login_mode(&self) -> LoginMode {
        self.read_state().login_mode
    }

    pub fn device_id(&self) -> Option<String> {
        self.read_state().device_id.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_state().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_state().refresh_token.clone()
    }

    /// Point-in-time copy of the whole session.
    pub fn snapshot(&self) -> SessionState {
        self.read_state().clone()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Reconstruct the session from the credential store.
    ///
    /// Never fails: unreadable entries and a corrupt stored user record
    /// degrade to an unauthenticated (or user-less) session, and
    /// `is_initialized` becomes true regardless. Safe to call again; it
    /// re-reads the store and overwrites the in-memory view.
    pub async fn initialize(&self) {
        let _guard = self.op.lock().await;

        let access_token = self.read_entry(CredentialKey::AccessToken);
        let refresh_token = self.read_entry(CredentialKey::RefreshToken);
        let user_info = self
            .read_entry(CredentialKey::UserCredentials)
            .and_then(|raw| match serde_json::from_str::<UserRecord>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Stored user record is corrupt, dropping it");
                    None
                }
            });

        let mut state = self.write_state();
        if state.device_id.is_none() {
            state.device_id = Some(generate_device_id());
        }
        state.is_authenticated = access_token.is_some();
        state.access_token = access_token;
        state.refresh_token = refresh_token;
        state.user_info = user_info;
        state.is_initialized = true;
        info!(
            authenticated = state.is_authenticated,
            has_user = state.user_info.is_some(),
            "Session initialized"
        );
    }

    fn read_entry(&self, key: CredentialKey) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Credential read failed, treating as absent");
                None
            }
        }
    }

    /// Authenticate and establish a session.
    ///
    /// Validation order: phone presence, account eligibility, then the
    /// supplied credential method. On success all three credential entries
    /// are persisted before the in-memory state flips to authenticated.
    pub async fn login(&self, credentials: Credentials) -> Result<(), AuthError> {
        let _guard = self.op.lock().await;
        match self.login_inner(credentials).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    async fn login_inner(&self, credentials: Credentials) -> Result<(), AuthError> {
        let phone = credentials
            .phone
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::InvalidCredentials)?;

        self.verifier.check_eligibility(phone).await?;

        let device_id = self
            .read_state()
            .device_id
            .clone()
            .unwrap_or_else(generate_device_id);

        let grant = if let Some(password) = credentials.password.as_deref() {
            if password.chars().count() < MIN_PASSWORD_LEN {
                return Err(AuthError::WeakCredentialFormat);
            }
            self.verifier
                .exchange_password(phone, password, &device_id)
                .await?
        } else if let Some(code) = credentials.sms_code.as_deref() {
            if code.chars().count() != SMS_CODE_LEN {
                return Err(AuthError::InvalidCredentialFormat);
            }
            self.verifier.exchange_sms(phone, code, &device_id).await?
        } else {
            return Err(AuthError::MissingCredentialMethod);
        };

        let user = grant.user.clone().ok_or_else(|| {
            AuthError::Service(ApiError::UnexpectedResponse(
                "login grant carried no user record".to_string(),
            ))
        })?;

        self.persist_grant(&grant, &user)?;

        let mut state = self.write_state();
        state.access_token = Some(grant.access_token.clone());
        state.refresh_token = Some(grant.refresh_token.clone());
        state.user_info = Some(user);
        state.is_authenticated = true;
        drop(state);

        info!(
            token = %redact_token(&grant.access_token),
            expires_in = grant.expires_in,
            "Login succeeded"
        );
        Ok(())
    }

    /// Store writes happen before the in-memory flip so a crash between the
    /// two leaves the store as the recoverable source of truth.
    fn persist_grant(&self, grant: &SessionGrant, user: &UserRecord) -> Result<(), AuthError> {
        let user_json = serde_json::to_string(user)?;
        self.store.set(CredentialKey::AccessToken, &grant.access_token)?;
        self.store.set(CredentialKey::RefreshToken, &grant.refresh_token)?;
        self.store.set(CredentialKey::UserCredentials, &user_json)?;
        Ok(())
    }

    /// End the session. Never fails outward: store cleanup is best-effort
    /// and the in-memory state transitions to unauthenticated regardless.
    pub async fn logout(&self) {
        let _guard = self.op.lock().await;
        self.clear_auth_data_inner();
        info!("Logout complete");
    }

    /// Delete the persisted credentials (best-effort) and reset the
    /// in-memory session fields. Idempotent.
    pub async fn clear_auth_data(&self) {
        let _guard = self.op.lock().await;
        self.clear_auth_data_inner();
    }

    fn clear_auth_data_inner(&self) {
        for key in CredentialKey::ALL {
            if let Err(e) = self.store.delete(key) {
                warn!(key = %key, error = %e, "Credential delete failed during clear");
            }
        }
        // The in-memory reset is unconditional; local state stays
        // authoritative even when the store cleanup failed.
        let mut state = self.write_state();
        state.is_authenticated = false;
        state.access_token = None;
        state.refresh_token = None;
        state.user_info = None;
    }

    /// Exchange the refresh token for new tokens.
    ///
    /// With no refresh token in the session this fails with
    /// `NoRefreshToken` and changes nothing. Any failure during the
    /// exchange or persistence clears the session before the error is
    /// returned - a failed refresh never leaves a stale-but-authenticated
    /// state.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _guard = self.op.lock().await;

        let refresh_token = self
            .read_state()
            .refresh_token
            .clone()
            .ok_or(AuthError::NoRefreshToken)?;

        match self.refresh_inner(&refresh_token).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.clear_auth_data_inner();
                Err(e)
            }
        }
    }

    async fn refresh_inner(&self, refresh_token: &str) -> Result<(), AuthError> {
        let grant = self.verifier.refresh(refresh_token).await?;

        // A refresh keeps the current identity unless the exchange returned
        // a fresh record.
        let user = grant
            .user
            .clone()
            .or_else(|| self.read_state().user_info.clone());
        match &user {
            Some(user) => self.persist_grant(&grant, user)?,
            None => {
                self.store.set(CredentialKey::AccessToken, &grant.access_token)?;
                self.store.set(CredentialKey::RefreshToken, &grant.refresh_token)?;
            }
        }

        let mut state = self.write_state();
        state.access_token = Some(grant.access_token.clone());
        state.refresh_token = Some(grant.refresh_token.clone());
        state.user_info = user;
        state.is_authenticated = true;
        drop(state);

        debug!(token = %redact_token(&grant.access_token), "Access token refreshed");
        Ok(())
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Replace the session's user record and persist it. Tokens and the
    /// authenticated flag are untouched; a persistence failure is logged
    /// and the in-memory replacement still happens.
    pub fn set_user_info(&self, user: UserRecord) {
        match serde_json::to_string(&user) {
            Ok(raw) => {
                if let Err(e) = self.store.set(CredentialKey::UserCredentials, &raw) {
                    warn!(error = %e, "Failed to persist user record");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode user record"),
        }
        self.write_state().user_info = Some(user);
    }

    /// In-memory only.
    pub fn set_login_mode(&self, mode: LoginMode) {
        self.write_state().login_mode = mode;
    }

    /// In-memory only.
    pub fn set_device_id(&self, device_id: impl Into<String>) {
        self.write_state().device_id = Some(device_id.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::error::{
        LoginMethod, MSG_BAD_ACCOUNT_OR_PASSWORD, MSG_BAD_OR_EXPIRED_CODE,
    };
    use crate::auth::verifier::AllowListVerifier;
    use crate::store::{MemoryBackend, SecureBackend};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FailingBackend;

    impl SecureBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn set(&self, _key: CredentialKey, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("backend unavailable"))
        }

        fn get(&self, _key: CredentialKey) -> anyhow::Result<Option<String>> {
            Err(anyhow!("backend unavailable"))
        }

        fn delete(&self, _key: CredentialKey) -> anyhow::Result<()> {
            Err(anyhow!("backend unavailable"))
        }
    }

    /// Verifier whose refresh exchange always fails.
    struct BrokenRefreshVerifier;

    #[async_trait]
    impl AccountVerifier for BrokenRefreshVerifier {
        async fn check_eligibility(&self, _phone: &str) -> Result<(), AuthError> {
            Ok(())
        }

        async fn exchange_password(
            &self,
            _phone: &str,
            _password: &str,
            _device_id: &str,
        ) -> Result<SessionGrant, AuthError> {
            Err(AuthError::CredentialMismatch(LoginMethod::Password))
        }

        async fn exchange_sms(
            &self,
            _phone: &str,
            _code: &str,
            _device_id: &str,
        ) -> Result<SessionGrant, AuthError> {
            Err(AuthError::CredentialMismatch(LoginMethod::Sms))
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<SessionGrant, AuthError> {
            Err(AuthError::Service(ApiError::Server("boom".into())))
        }
    }

    fn manager() -> (SessionManager, MemoryBackend) {
        let primary = MemoryBackend::new();
        let store = CredentialStore::new(
            Box::new(primary.clone()),
            Box::new(MemoryBackend::new()),
        );
        let manager =
            SessionManager::new(store, Box::new(AllowListVerifier::with_test_accounts()));
        (manager, primary)
    }

    fn password_login() -> Credentials {
        Credentials::password_login("13800138000", "test123456")
    }

    #[tokio::test]
    async fn test_initialize_empty_store() {
        let (manager, _) = manager();
        assert!(!manager.is_initialized());

        manager.initialize().await;

        assert!(manager.is_initialized());
        assert!(!manager.is_authenticated());
        assert!(manager.user_info().is_none());
        // The device id is minted on first initialize.
        assert!(manager.device_id().unwrap().starts_with("device_"));
    }

    #[tokio::test]
    async fn test_initialize_restores_persisted_session() {
        let (manager, primary) = manager();
        let user = UserRecord {
            id: "u_1001".to_string(),
            phone: "13800138000".to_string(),
            nickname: "测试用户一".to_string(),
            avatar: None,
            verified: true,
            created_at: Utc::now(),
        };
        primary.set(CredentialKey::AccessToken, "at-persisted").unwrap();
        primary.set(CredentialKey::RefreshToken, "rt-persisted").unwrap();
        primary
            .set(
                CredentialKey::UserCredentials,
                &serde_json::to_string(&user).unwrap(),
            )
            .unwrap();

        manager.initialize().await;

        assert!(manager.is_authenticated());
        assert_eq!(manager.access_token().as_deref(), Some("at-persisted"));
        assert_eq!(manager.refresh_token().as_deref(), Some("rt-persisted"));
        assert_eq!(manager.user_info().unwrap().nickname, "测试用户一");
    }

    #[tokio::test]
    async fn test_initialize_swallows_corrupt_user_record() {
        let (manager, primary) = manager();
        primary.set(CredentialKey::AccessToken, "at-1").unwrap();
        primary
            .set(CredentialKey::UserCredentials, "{not valid json")
            .unwrap();

        manager.initialize().await;

        // Token still authenticates the session; only the user record drops.
        assert!(manager.is_initialized());
        assert!(manager.is_authenticated());
        assert!(manager.user_info().is_none());
    }

    #[tokio::test]
    async fn test_initialize_never_fails_on_total_store_failure() {
        let store =
            CredentialStore::new(Box::new(FailingBackend), Box::new(FailingBackend));
        let manager =
            SessionManager::new(store, Box::new(AllowListVerifier::with_test_accounts()));

        manager.initialize().await;

        assert!(manager.is_initialized());
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (manager, _) = manager();
        manager.initialize().await;
        let device_id = manager.device_id();

        manager.initialize().await;

        assert!(manager.is_initialized());
        assert_eq!(manager.device_id(), device_id);
    }

    #[tokio::test]
    async fn test_login_success_persists_then_authenticates() {
        let (manager, primary) = manager();
        manager.initialize().await;

        manager.login(password_login()).await.unwrap();

        assert!(manager.is_authenticated());
        let access = manager.access_token().unwrap();
        let refresh = manager.refresh_token().unwrap();
        let user = manager.user_info().unwrap();
        assert_eq!(user.nickname, "测试用户一");

        // Round-trip: the three store entries equal the in-memory values.
        assert_eq!(
            primary.get(CredentialKey::AccessToken).unwrap().as_deref(),
            Some(access.as_str())
        );
        assert_eq!(
            primary.get(CredentialKey::RefreshToken).unwrap().as_deref(),
            Some(refresh.as_str())
        );
        let stored_user: UserRecord = serde_json::from_str(
            &primary
                .get(CredentialKey::UserCredentials)
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(stored_user, user);
    }

    #[tokio::test]
    async fn test_login_twice_issues_distinct_tokens() {
        let (manager, _) = manager();
        manager.login(password_login()).await.unwrap();
        let first = manager.access_token().unwrap();

        manager.login(password_login()).await.unwrap();

        assert_ne!(manager.access_token().unwrap(), first);
    }

    #[tokio::test]
    async fn test_login_without_phone() {
        let (manager, _) = manager();
        let before = manager.snapshot();

        let err = manager
            .login(Credentials {
                phone: None,
                password: Some("test123456".to_string()),
                sms_code: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(manager.snapshot(), before);
    }

    #[tokio::test]
    async fn test_login_with_unlisted_phone() {
        let (manager, _) = manager();
        let before = manager.snapshot();

        let err = manager
            .login(Credentials::password_login("13900000000", "test123456"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::AccountNotEligible));
        assert_eq!(err.user_message(), MSG_BAD_ACCOUNT_OR_PASSWORD);
        assert_eq!(manager.snapshot(), before);
    }

    #[tokio::test]
    async fn test_login_with_short_password() {
        let (manager, _) = manager();

        let err = manager
            .login(Credentials::password_login("13800138000", "abc"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::WeakCredentialFormat));
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let (manager, primary) = manager();
        let before = manager.snapshot();

        let err = manager
            .login(Credentials::password_login("13800138000", "wrong123"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AuthError::CredentialMismatch(LoginMethod::Password)
        ));
        assert_eq!(err.user_message(), MSG_BAD_ACCOUNT_OR_PASSWORD);
        assert_eq!(manager.snapshot(), before);
        // Nothing was persisted either.
        assert_eq!(primary.get(CredentialKey::AccessToken).unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_with_malformed_sms_code() {
        let (manager, _) = manager();

        let err = manager
            .login(Credentials::sms_login("13800138000", "123"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentialFormat));
        assert_eq!(err.user_message(), MSG_BAD_OR_EXPIRED_CODE);
    }

    #[tokio::test]
    async fn test_login_with_wrong_sms_code() {
        let (manager, _) = manager();

        let err = manager
            .login(Credentials::sms_login("13800138000", "000000"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::CredentialMismatch(LoginMethod::Sms)));
        assert_eq!(err.user_message(), MSG_BAD_OR_EXPIRED_CODE);
    }

    #[tokio::test]
    async fn test_login_with_sms_code_succeeds() {
        let (manager, _) = manager();

        manager
            .login(Credentials::sms_login("13800138001", "666666"))
            .await
            .unwrap();

        assert!(manager.is_authenticated());
        assert_eq!(manager.user_info().unwrap().nickname, "测试用户二");
    }

    #[tokio::test]
    async fn test_login_without_any_credential_method() {
        let (manager, _) = manager();

        let err = manager
            .login(Credentials {
                phone: Some("13800138000".to_string()),
                password: None,
                sms_code: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MissingCredentialMethod));
    }

    #[tokio::test]
    async fn test_logout_clears_state_and_store_idempotently() {
        let (manager, primary) = manager();
        manager.login(password_login()).await.unwrap();

        manager.logout().await;

        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());
        assert!(manager.refresh_token().is_none());
        assert!(manager.user_info().is_none());
        for key in CredentialKey::ALL {
            assert_eq!(primary.get(key).unwrap(), None);
        }

        // Logging out again ends in the same state.
        manager.logout().await;
        assert!(!manager.is_authenticated());
        for key in CredentialKey::ALL {
            assert_eq!(primary.get(key).unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_logout_never_fails_when_store_is_down() {
        let store =
            CredentialStore::new(Box::new(FailingBackend), Box::new(FailingBackend));
        let manager =
            SessionManager::new(store, Box::new(AllowListVerifier::with_test_accounts()));

        // Local state is authoritative: logout completes despite the store.
        manager.logout().await;
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_without_token_leaves_session_unchanged() {
        let (manager, _) = manager();
        manager.initialize().await;
        let before = manager.snapshot();

        let err = manager.refresh().await.unwrap_err();

        assert!(matches!(err, AuthError::NoRefreshToken));
        assert_eq!(manager.snapshot(), before);
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens_and_keeps_user() {
        let (manager, primary) = manager();
        manager.login(password_login()).await.unwrap();
        let old_access = manager.access_token().unwrap();
        let user_before = manager.user_info().unwrap();

        manager.refresh().await.unwrap();

        assert!(manager.is_authenticated());
        let new_access = manager.access_token().unwrap();
        assert_ne!(new_access, old_access);
        assert_eq!(manager.user_info().unwrap(), user_before);
        // New tokens are persisted, the user record survives.
        assert_eq!(
            primary.get(CredentialKey::AccessToken).unwrap().as_deref(),
            Some(new_access.as_str())
        );
        let stored_user: UserRecord = serde_json::from_str(
            &primary
                .get(CredentialKey::UserCredentials)
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(stored_user, user_before);
    }

    #[tokio::test]
    async fn test_refresh_failure_downgrades_to_unauthenticated() {
        let primary = MemoryBackend::new();
        let store = CredentialStore::new(
            Box::new(primary.clone()),
            Box::new(MemoryBackend::new()),
        );
        let manager = SessionManager::new(store, Box::new(BrokenRefreshVerifier));

        // Seed an authenticated session directly through the store.
        primary.set(CredentialKey::AccessToken, "at-1").unwrap();
        primary.set(CredentialKey::RefreshToken, "rt-1").unwrap();
        manager.initialize().await;
        assert!(manager.is_authenticated());

        let err = manager.refresh().await.unwrap_err();

        assert!(matches!(err, AuthError::Service(_)));
        assert!(!manager.is_authenticated());
        assert!(manager.refresh_token().is_none());
        for key in CredentialKey::ALL {
            assert_eq!(primary.get(key).unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_refresh_persist_failure_also_clears_session() {
        // The exchange succeeds but the store has died: the session must
        // still end up unauthenticated.
        let store = CredentialStore::new(Box::new(FailingBackend), Box::new(FailingBackend));
        let manager =
            SessionManager::new(store, Box::new(AllowListVerifier::with_test_accounts()));
        {
            let mut state = manager.write_state();
            state.access_token = Some("at-1".to_string());
            state.refresh_token = Some("rt-1".to_string());
            state.is_authenticated = true;
        }

        let err = manager.refresh().await.unwrap_err();

        assert!(matches!(err, AuthError::StoreUnavailable(_)));
        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());
    }

    #[tokio::test]
    async fn test_set_user_info_replaces_and_persists() {
        let (manager, primary) = manager();
        manager.login(password_login()).await.unwrap();
        let tokens_before = (manager.access_token(), manager.refresh_token());

        let updated = UserRecord {
            nickname: "新昵称".to_string(),
            ..manager.user_info().unwrap()
        };
        manager.set_user_info(updated.clone());

        assert_eq!(manager.user_info().unwrap(), updated);
        // Tokens and the authenticated flag are untouched.
        assert_eq!(
            (manager.access_token(), manager.refresh_token()),
            tokens_before
        );
        assert!(manager.is_authenticated());
        let stored: UserRecord = serde_json::from_str(
            &primary
                .get(CredentialKey::UserCredentials)
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_mode_and_device_setters_are_memory_only() {
        let (manager, primary) = manager();

        manager.set_login_mode(LoginMode::Sms);
        manager.set_device_id("device_42_fixed");

        assert_eq!(manager.login_mode(), LoginMode::Sms);
        assert_eq!(manager.device_id().as_deref(), Some("device_42_fixed"));
        for key in CredentialKey::ALL {
            assert_eq!(primary.get(key).unwrap(), None);
        }
    }
}
