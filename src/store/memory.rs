use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;

use super::{CredentialKey, SecureBackend};

/// In-process storage tier.
///
/// Clones share the same underlying map, which lets tests keep a handle on a
/// backend after handing it to a `CredentialStore`. Also usable as a
/// deliberate "forget on exit" tier for ephemeral sessions.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<&'static str, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SecureBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.lock().insert(key.storage_key(), value.to_string());
        Ok(())
    }

    fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        Ok(self.lock().get(key.storage_key()).cloned())
    }

    fn delete(&self, key: CredentialKey) -> Result<()> {
        self.lock().remove(key.storage_key());
        Ok(())
    }
}
