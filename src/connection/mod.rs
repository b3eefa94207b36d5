pub mod config;
pub mod pool;

use crate::core::{Change, Profile, User};
use crate::storage::{HistoryStore, MemoryStore, ProfileStore, StoreResult, UserStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Storage handle leased to a single request.
///
/// Similar to a pooled database connection: it is owned by exactly one
/// in-flight request at a time and goes back to the pool when the
/// [`SessionLease`](pool::SessionLease) holding it is released.
#[derive(Debug)]
pub struct StorageSession {
    /// Unique session ID
    id: u64,
    /// Shared document store
    store: Arc<MemoryStore>,
    created_at: Instant,
    last_used: Instant,
}

impl StorageSession {
    pub(crate) fn new(id: u64, store: Arc<MemoryStore>) -> Self {
        let now = Instant::now();
        Self {
            id,
            store,
            created_at: now,
            last_used: now,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Check if the underlying store still accepts work
    pub fn is_usable(&self) -> bool {
        self.store.is_open()
    }

    pub(crate) fn is_expired(&self, max_lifetime: Option<Duration>) -> bool {
        max_lifetime.is_some_and(|lifetime| self.created_at.elapsed() > lifetime)
    }

    pub(crate) fn is_idle_too_long(&self, idle_timeout: Option<Duration>) -> bool {
        idle_timeout.is_some_and(|timeout| self.last_used.elapsed() > timeout)
    }

    pub(crate) fn refresh_last_used(&mut self) {
        self.last_used = Instant::now();
    }
}

#[async_trait]
impl UserStore for StorageSession {
    async fn insert_user(&self, email: &str, password: &str) -> StoreResult<User> {
        self.store.insert_user(email, password).await
    }

    async fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>> {
        self.store.find_user_by_credentials(email, password).await
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.store.get_user(id).await
    }

    async fn confirm_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.store.confirm_user(id).await
    }
}

#[async_trait]
impl ProfileStore for StorageSession {
    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        self.store.get_profile(id).await
    }

    async fn list_profiles(&self, limit: usize) -> StoreResult<Vec<Profile>> {
        self.store.list_profiles(limit).await
    }

    async fn put_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.store.put_profile(profile).await
    }
}

#[async_trait]
impl HistoryStore for StorageSession {
    async fn append(&self, profile_id: &str, change: &Change) -> StoreResult<()> {
        self.store.append(profile_id, change).await
    }

    async fn list(&self, profile_id: &str) -> StoreResult<Vec<Change>> {
        self.store.list(profile_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;

    fn create_test_session() -> (Arc<MemoryStore>, StorageSession) {
        let store = Arc::new(MemoryStore::new());
        let session = StorageSession::new(1, Arc::clone(&store));
        (store, session)
    }

    #[test]
    fn test_session_creation() {
        let (_store, session) = create_test_session();
        assert_eq!(session.id(), 1);
        assert!(session.is_usable());
        assert!(!session.is_expired(None));
        assert!(!session.is_idle_too_long(Some(Duration::from_secs(60))));
    }

    #[test]
    fn test_session_expiry() {
        let (_store, session) = create_test_session();
        std::thread::sleep(Duration::from_millis(5));
        assert!(session.is_expired(Some(Duration::from_millis(1))));
        assert!(session.is_idle_too_long(Some(Duration::from_millis(1))));
    }

    #[tokio::test]
    async fn test_session_delegates_to_store() {
        let (store, session) = create_test_session();
        let user = session.insert_user("a@mail.com", "pw").await.unwrap();

        assert_eq!(store.get_user(&user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_session_unusable_after_store_close() {
        let (store, session) = create_test_session();
        store.close();

        assert!(!session.is_usable());
        assert_eq!(session.get_user("x").await, Err(StoreError::Closed));
    }
}
