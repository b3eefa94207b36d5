// ============================================================================
// Profile Keeper Library
// ============================================================================

//! Identity and profile service with ownership checks and an append-only
//! change history.
//!
//! Every request leases a storage session from a [`SessionPool`], runs inside a
//! [`RequestContext`] and goes through the services in [`service`]. The HTTP
//! boundary in [`web`] is one way to drive them; the services can equally be
//! called directly.
//!
//! # Examples
//!
//! ```
//! use profile_keeper::{NewUser, ProfileService, UserService, storage::MemoryStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let users = UserService::new();
//!
//! let id = users
//!     .create_with(&store, NewUser {
//!         email: "john@mail.com".to_string(),
//!         password: "secret".to_string(),
//!     })
//!     .await?;
//! users.confirm_with(&store, &id).await?;
//!
//! let profile = ProfileService::new().get_with(&store, &id).await?;
//! assert_eq!(profile.id, id);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod connection;
pub mod context;
pub mod core;
pub mod history;
pub mod service;
pub mod storage;
pub mod web;

// Re-export main types for convenience
pub use core::{
    Change, ChangedField, ErrorKind, FieldValue, Identity, NewUser, Profile, Result,
    ServiceError, User,
};
pub use context::{CancellationToken, Canceller, RequestContext};
pub use service::{ProfileService, UserService};

// Re-export pooling API
pub use connection::{
    StorageSession,
    config::PoolConfig,
    pool::{PoolStats, SessionLease, SessionPool},
};

pub use auth::{AccessGuard, AuthResolver, Credentials, OwnerGuard};
pub use history::ProfileDiffer;
pub use storage::{HistoryStore, MemoryStore, ProfileStore, StoreError, UserStore};
pub use web::{AppState, build_router};
