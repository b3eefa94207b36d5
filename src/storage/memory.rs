use super::{HistoryStore, ProfileStore, StoreError, StoreResult, UserStore};
use crate::core::{Change, Profile, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One document per person: the account, its profile and its change log.
#[derive(Debug, Clone)]
struct Document {
    user: User,
    profile: Profile,
    changes: Vec<Change>,
}

#[derive(Debug, Default)]
struct Collections {
    documents: HashMap<String, Document>,
    /// Unique index: email -> document id
    emails: HashMap<String, String>,
}

impl Collections {
    fn confirmed_mut(&mut self, id: &str) -> StoreResult<&mut Document> {
        self.documents
            .get_mut(id)
            .filter(|doc| doc.user.confirmed)
            .ok_or_else(|| StoreError::Missing(id.to_string()))
    }
}

/// In-memory document store.
///
/// Documents live under a single lock, so every operation is atomic with
/// respect to the others.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    open: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Collections::default()),
            open: AtomicBool::new(true),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Stops serving requests. Data stays in memory until the store is dropped.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn reopen(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub async fn document_count(&self) -> usize {
        self.collections.read().await.documents.len()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, email: &str, password: &str) -> StoreResult<User> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;

        if collections.emails.contains_key(email) {
            return Err(StoreError::Duplicate(format!("email '{}'", email)));
        }

        let id = Uuid::new_v4().to_string();
        let user = User {
            id: id.clone(),
            email: email.to_string(),
            password: password.to_string(),
            confirmed: false,
        };

        collections.emails.insert(email.to_string(), id.clone());
        collections.documents.insert(
            id.clone(),
            Document {
                user: user.clone(),
                profile: Profile::empty(id),
                changes: Vec::new(),
            },
        );

        Ok(user)
    }

    async fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;

        let user = collections
            .emails
            .get(email)
            .and_then(|id| collections.documents.get(id))
            .filter(|doc| doc.user.password == password)
            .map(|doc| doc.user.clone());

        Ok(user)
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;
        Ok(collections.documents.get(id).map(|doc| doc.user.clone()))
    }

    async fn confirm_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;

        match collections.documents.get_mut(id) {
            Some(doc) if !doc.user.confirmed => {
                doc.user.confirmed = true;
                Ok(Some(doc.user.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;

        Ok(collections
            .documents
            .get(id)
            .filter(|doc| doc.user.confirmed)
            .map(|doc| doc.profile.clone()))
    }

    async fn list_profiles(&self, limit: usize) -> StoreResult<Vec<Profile>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;

        let mut profiles: Vec<Profile> = collections
            .documents
            .values()
            .filter(|doc| doc.user.confirmed)
            .map(|doc| doc.profile.clone())
            .collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles.truncate(limit);

        Ok(profiles)
    }

    async fn put_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;

        let doc = collections.confirmed_mut(&profile.id)?;
        doc.profile = profile.clone();
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, profile_id: &str, change: &Change) -> StoreResult<()> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;

        let doc = collections.confirmed_mut(profile_id)?;
        let mut change = change.clone();
        // Timestamp order must agree with insertion order, even when a
        // concurrent request diffed earlier but appends later.
        if let Some(last) = doc.changes.last()
            && change.timestamp < last.timestamp
        {
            change.timestamp = last.timestamp;
        }
        doc.changes.push(change);
        Ok(())
    }

    async fn list(&self, profile_id: &str) -> StoreResult<Vec<Change>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;

        Ok(collections
            .documents
            .get(profile_id)
            .map(|doc| doc.changes.clone())
            .unwrap_or_default())
    }
}
