//! Storage contracts and the in-memory document store behind them.
//!
//! The service only talks to the three traits below. `MemoryStore` is the one
//! concrete engine; requests reach it through a leased
//! [`StorageSession`](crate::connection::StorageSession).

pub mod memory;

use crate::core::{Change, Profile, User};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store is closed")]
    Closed,

    #[error("Session was already released")]
    Released,

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Document '{0}' not found")]
    Missing(String),

    #[error("Backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts an unconfirmed user under a fresh id.
    ///
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, email: &str, password: &str) -> StoreResult<User>;

    async fn find_user_by_credentials(&self, email: &str, password: &str)
    -> StoreResult<Option<User>>;

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;

    /// Flips `confirmed` from false to true.
    ///
    /// Returns `None` when no unconfirmed user with this id exists.
    async fn confirm_user(&self, id: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profile of a confirmed user.
    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>>;

    async fn list_profiles(&self, limit: usize) -> StoreResult<Vec<Profile>>;

    async fn put_profile(&self, profile: &Profile) -> StoreResult<()>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, profile_id: &str, change: &Change) -> StoreResult<()>;

    /// Changes recorded for the profile, oldest first.
    async fn list(&self, profile_id: &str) -> StoreResult<Vec<Change>>;
}
