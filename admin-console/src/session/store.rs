use async_trait::async_trait;
use secrecy::Secret;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tower_sessions::Session;
use uuid::Uuid;

use super::vault::CredentialVault;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const ROLE_KEY: &str = "user_role";
/// The only value the cookie-keyed session record holds.
pub const CREDENTIAL_SLOT_KEY: &str = "credential_slot";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session storage error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Snapshot of the persisted credential. Values are opaque; the role tag is
/// kept as stored and only interpreted by the session predicate.
#[derive(Debug)]
pub struct Credentials {
    pub access_token: Secret<String>,
    pub refresh_token: Option<Secret<String>>,
    pub role: Option<String>,
}

impl Credentials {
    fn from_values(values: &HashMap<&'static str, String>) -> Option<Self> {
        let access = values.get(ACCESS_TOKEN_KEY)?;
        Some(Self {
            access_token: Secret::new(access.clone()),
            refresh_token: values.get(REFRESH_TOKEN_KEY).cloned().map(Secret::new),
            role: values.get(ROLE_KEY).cloned(),
        })
    }
}

/// Durable storage for the current session's credential.
///
/// Every call goes to the backing storage; implementations must not keep an
/// authoritative copy in memory between calls.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `None` when no access credential is stored.
    async fn read(&self) -> Result<Option<Credentials>, StoreError>;

    /// Overwrite both tokens. The role is left untouched.
    async fn save(&self, access: &str, refresh: &str) -> Result<(), StoreError>;

    /// Overwrite the access token of an existing credential. No-op once the
    /// credential has been cleared.
    async fn save_access(&self, access: &str) -> Result<(), StoreError>;

    /// Tag an existing credential with a role. No-op once cleared.
    async fn set_role(&self, role: &str) -> Result<(), StoreError>;

    /// Store renewed tokens only if the credential still carries
    /// `rejected_access`. Returns false when it was cleared or replaced.
    async fn replace_access(
        &self,
        rejected_access: &str,
        access: &str,
        refresh: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Remove access token, refresh token and role.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Credential store for one browser session.
///
/// The `tower-sessions` record only names a vault slot; tokens and role are
/// read from and written to the shared [`CredentialVault`] on every call.
#[derive(Clone)]
pub struct SessionCredentialStore {
    session: Session,
    vault: CredentialVault,
}

impl SessionCredentialStore {
    pub fn new(session: Session, vault: CredentialVault) -> Self {
        Self { session, vault }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn slot(&self) -> Result<Option<String>, StoreError> {
        Ok(self.session.get::<String>(CREDENTIAL_SLOT_KEY).await?)
    }
}

#[async_trait]
impl CredentialStore for SessionCredentialStore {
    async fn read(&self) -> Result<Option<Credentials>, StoreError> {
        let Some(slot) = self.slot().await? else {
            return Ok(None);
        };
        Ok(self
            .vault
            .get(&slot)
            .and_then(|values| Credentials::from_values(&values)))
    }

    async fn save(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        let slot = match self.slot().await? {
            Some(slot) => slot,
            None => {
                let slot = Uuid::new_v4().to_string();
                self.session.insert(CREDENTIAL_SLOT_KEY, &slot).await?;
                slot
            }
        };
        self.vault
            .upsert(&slot, &[(ACCESS_TOKEN_KEY, access), (REFRESH_TOKEN_KEY, refresh)]);
        Ok(())
    }

    async fn save_access(&self, access: &str) -> Result<(), StoreError> {
        if let Some(slot) = self.slot().await? {
            self.vault.update(&slot, ACCESS_TOKEN_KEY, access);
        }
        Ok(())
    }

    async fn set_role(&self, role: &str) -> Result<(), StoreError> {
        if let Some(slot) = self.slot().await? {
            self.vault.update(&slot, ROLE_KEY, role);
        }
        Ok(())
    }

    async fn replace_access(
        &self,
        rejected_access: &str,
        access: &str,
        refresh: Option<&str>,
    ) -> Result<bool, StoreError> {
        Ok(match self.slot().await? {
            Some(slot) => self
                .vault
                .replace_access(&slot, rejected_access, access, refresh),
            None => false,
        })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        if let Some(slot) = self.slot().await? {
            self.vault.remove(&slot);
        }
        self.session.remove_value(CREDENTIAL_SLOT_KEY).await?;
        Ok(())
    }
}

/// In-process store with the same key layout, for tests and tooling.
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    values: Arc<Mutex<HashMap<&'static str, String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value stored under `key`, bypassing the credential view.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    /// Write `key` directly, bypassing the credential rules.
    pub fn insert_raw(&self, key: &'static str, value: &str) {
        self.values().insert(key, value.to_string());
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn read(&self) -> Result<Option<Credentials>, StoreError> {
        Ok(Credentials::from_values(&self.values()))
    }

    async fn save(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        let mut values = self.values();
        values.insert(ACCESS_TOKEN_KEY, access.to_string());
        values.insert(REFRESH_TOKEN_KEY, refresh.to_string());
        Ok(())
    }

    async fn save_access(&self, access: &str) -> Result<(), StoreError> {
        let mut values = self.values();
        if values.contains_key(ACCESS_TOKEN_KEY) {
            values.insert(ACCESS_TOKEN_KEY, access.to_string());
        }
        Ok(())
    }

    async fn set_role(&self, role: &str) -> Result<(), StoreError> {
        let mut values = self.values();
        if values.contains_key(ACCESS_TOKEN_KEY) {
            values.insert(ROLE_KEY, role.to_string());
        }
        Ok(())
    }

    async fn replace_access(
        &self,
        rejected_access: &str,
        access: &str,
        refresh: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut values = self.values();
        if values.get(ACCESS_TOKEN_KEY).map(String::as_str) != Some(rejected_access) {
            return Ok(false);
        }
        values.insert(ACCESS_TOKEN_KEY, access.to_string());
        if let Some(refresh) = refresh {
            values.insert(REFRESH_TOKEN_KEY, refresh.to_string());
        }
        Ok(true)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut values = self.values();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, ROLE_KEY] {
            values.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::sync::Arc as StdArc;
    use std::time::Duration;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn save_then_read_returns_both_tokens() {
        let store = MemoryCredentialStore::new();
        store.save("access-1", "refresh-1").await.unwrap();

        let credentials = store.read().await.unwrap().unwrap();
        assert_eq!(credentials.access_token.expose_secret(), "access-1");
        assert_eq!(
            credentials.refresh_token.unwrap().expose_secret(),
            "refresh-1"
        );
        assert!(credentials.role.is_none());
    }

    #[tokio::test]
    async fn save_access_keeps_refresh_and_role() {
        let store = MemoryCredentialStore::new();
        store.save("access-1", "refresh-1").await.unwrap();
        store.set_role("admin").await.unwrap();
        store.save_access("access-2").await.unwrap();

        let credentials = store.read().await.unwrap().unwrap();
        assert_eq!(credentials.access_token.expose_secret(), "access-2");
        assert_eq!(
            credentials.refresh_token.unwrap().expose_secret(),
            "refresh-1"
        );
        assert_eq!(credentials.role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn clear_removes_every_field() {
        let store = MemoryCredentialStore::new();
        store.save("access-1", "refresh-1").await.unwrap();
        store.set_role("admin").await.unwrap();
        store.clear().await.unwrap();

        assert!(store.read().await.unwrap().is_none());
        assert!(store.raw(REFRESH_TOKEN_KEY).is_none());
        assert!(store.raw(ROLE_KEY).is_none());
    }

    #[tokio::test]
    async fn refresh_without_access_reads_as_empty() {
        let store = MemoryCredentialStore::new();
        store.save("access-1", "refresh-1").await.unwrap();
        store.values().remove(ACCESS_TOKEN_KEY);

        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_access_and_role_never_recreate_a_cleared_credential() {
        let store = MemoryCredentialStore::new();
        store.save("access-1", "refresh-1").await.unwrap();
        store.clear().await.unwrap();

        store.save_access("access-2").await.unwrap();
        store.set_role("admin").await.unwrap();

        assert!(store.read().await.unwrap().is_none());
        assert!(store.raw(ROLE_KEY).is_none());
    }

    #[tokio::test]
    async fn replace_access_only_swaps_the_rejected_token() {
        let store = MemoryCredentialStore::new();
        store.save("access-1", "refresh-1").await.unwrap();

        assert!(!store.replace_access("stale", "access-2", None).await.unwrap());
        assert!(store
            .replace_access("access-1", "access-2", Some("refresh-2"))
            .await
            .unwrap());
        assert_eq!(store.raw(ACCESS_TOKEN_KEY).as_deref(), Some("access-2"));
        assert_eq!(store.raw(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-2"));
    }

    fn session_store() -> (SessionCredentialStore, Session, CredentialVault) {
        let session = Session::new(None, StdArc::new(MemoryStore::default()), None);
        let vault = CredentialVault::new(Duration::from_secs(3600));
        let store = SessionCredentialStore::new(session.clone(), vault.clone());
        (store, session, vault)
    }

    #[tokio::test]
    async fn session_record_only_names_the_vault_slot() {
        let (store, session, vault) = session_store();

        store.save("access-1", "refresh-1").await.unwrap();
        store.set_role("scorekeeper").await.unwrap();

        let access: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap();
        let slot: Option<String> = session.get(CREDENTIAL_SLOT_KEY).await.unwrap();
        assert!(access.is_none());
        let values = vault.get(&slot.unwrap()).unwrap();
        assert_eq!(values[ACCESS_TOKEN_KEY], "access-1");
        assert_eq!(values[ROLE_KEY], "scorekeeper");
    }

    #[tokio::test]
    async fn stale_session_record_cannot_restore_a_cleared_credential() {
        let (store, session, vault) = session_store();
        store.save("access-1", "refresh-1").await.unwrap();
        let slot: String = session.get(CREDENTIAL_SLOT_KEY).await.unwrap().unwrap();

        store.clear().await.unwrap();
        assert!(vault.is_empty());

        // A concurrent request writing back its older copy of the record
        session.insert(CREDENTIAL_SLOT_KEY, &slot).await.unwrap();
        assert!(store.read().await.unwrap().is_none());
        assert!(!store.replace_access("access-1", "access-2", None).await.unwrap());
        store.set_role("admin").await.unwrap();
        assert!(vault.is_empty());
    }
}
