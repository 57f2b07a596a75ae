use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::{CredentialKey, SecureBackend};

/// Namespace prefix for entries written by this tier, so a shared key-value
/// file can never collide with keys owned by other subsystems.
const FALLBACK_KEY_PREFIX: &str = "secure_";

/// Fallback storage tier: a JSON map file on disk.
///
/// This tier exists so the session survives on devices where the keychain is
/// unavailable, permission-denied, or corrupt. Values are written in
/// plaintext with nothing beyond filesystem permissions protecting them;
/// callers should treat any session that degraded to this tier as stored at
/// reduced security.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn namespaced(key: CredentialKey) -> String {
        format!("{FALLBACK_KEY_PREFIX}{}", key.storage_key())
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read fallback store {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse fallback store {}", self.path.display()))
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write fallback store {}", self.path.display()))
    }
}

impl SecureBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(Self::namespaced(key), value.to_string());
        self.save(&entries)
    }

    fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        Ok(self.load()?.remove(&Self::namespaced(key)))
    }

    fn delete(&self, key: CredentialKey) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(&Self::namespaced(key)).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, FileBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("credentials.json"));
        (dir, backend)
    }

    #[test]
    fn test_round_trip_and_delete() {
        let (_dir, backend) = backend();

        assert_eq!(backend.get(CredentialKey::AccessToken).unwrap(), None);

        backend.set(CredentialKey::AccessToken, "tok-a").unwrap();
        backend.set(CredentialKey::RefreshToken, "tok-r").unwrap();
        assert_eq!(
            backend.get(CredentialKey::AccessToken).unwrap().as_deref(),
            Some("tok-a")
        );

        backend.delete(CredentialKey::AccessToken).unwrap();
        assert_eq!(backend.get(CredentialKey::AccessToken).unwrap(), None);
        // Other entries are untouched.
        assert_eq!(
            backend.get(CredentialKey::RefreshToken).unwrap().as_deref(),
            Some("tok-r")
        );
    }

    #[test]
    fn test_entries_are_namespaced_on_disk() {
        let (dir, backend) = backend();
        backend.set(CredentialKey::UserCredentials, "{}").unwrap();

        let raw = std::fs::read_to_string(dir.path().join("credentials.json")).unwrap();
        assert!(raw.contains("secure_USER_CREDENTIALS"), "{raw}");
    }

    #[test]
    fn test_corrupt_store_file_is_an_error() {
        let (dir, backend) = backend();
        std::fs::write(dir.path().join("credentials.json"), "not json").unwrap();

        assert!(backend.get(CredentialKey::AccessToken).is_err());
    }

    #[test]
    fn test_delete_missing_entry_is_ok() {
        let (_dir, backend) = backend();
        backend.delete(CredentialKey::RefreshToken).unwrap();
    }
}
