use super::{StorageSession, config::PoolConfig};
use crate::core::{Result, ServiceError};
use crate::storage::{MemoryStore, StoreError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

/// Session pool
///
/// Hands every in-flight request its own [`StorageSession`]. Leases are
/// independent of each other; a lease only waits when `max_sessions` leases
/// are already out.
pub struct SessionPool {
    /// Pool configuration
    config: PoolConfig,
    /// Shared document store
    store: Arc<MemoryStore>,
    /// One permit per session that may be leased concurrently
    permits: Arc<Semaphore>,
    /// State the leases return sessions into
    shared: Arc<PoolShared>,
}

#[derive(Debug)]
struct PoolShared {
    /// Sessions ready to be leased
    idle: Mutex<VecDeque<StorageSession>>,
    /// Sessions alive, idle or leased
    total_sessions: AtomicUsize,
    /// Next session ID
    next_id: AtomicU64,
    idle_timeout: Option<Duration>,
    max_lifetime: Option<Duration>,
}

impl PoolShared {
    // Never held across an await, so a std mutex is enough and lets Drop
    // return sessions without blocking.
    fn idle(&self) -> MutexGuard<'_, VecDeque<StorageSession>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_session(&self, store: &Arc<MemoryStore>) -> StorageSession {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.total_sessions.fetch_add(1, Ordering::SeqCst);
        debug!(session_id = id, "opened storage session");
        StorageSession::new(id, Arc::clone(store))
    }

    fn is_stale(&self, session: &StorageSession) -> bool {
        !session.is_usable()
            || session.is_expired(self.max_lifetime)
            || session.is_idle_too_long(self.idle_timeout)
    }

    /// Pop the first healthy idle session, retiring stale ones on the way
    fn take_idle(&self) -> Option<StorageSession> {
        let mut idle = self.idle();
        let mut retired = 0usize;

        let found = loop {
            match idle.pop_front() {
                Some(session) if self.is_stale(&session) => retired += 1,
                other => break other,
            }
        };

        if retired > 0 {
            self.total_sessions.fetch_sub(retired, Ordering::SeqCst);
            debug!(retired, "retired stale storage sessions");
        }

        found
    }

    fn give_back(&self, session: StorageSession) {
        if self.is_stale(&session) {
            self.total_sessions.fetch_sub(1, Ordering::SeqCst);
            debug!(session_id = session.id(), "dropped stale storage session");
            return;
        }

        self.idle().push_back(session);
    }
}

impl SessionPool {
    /// Create a pool over `store`, opening `min_idle` sessions up front
    pub fn new(config: PoolConfig, store: Arc<MemoryStore>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ServiceError::bad_input(format!("invalid pool config: {}", e)))?;

        let shared = Arc::new(PoolShared {
            idle: Mutex::new(VecDeque::with_capacity(config.max_sessions)),
            total_sessions: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            idle_timeout: config.idle_timeout,
            max_lifetime: config.max_lifetime,
        });

        let pool = Self {
            permits: Arc::new(Semaphore::new(config.max_sessions)),
            config,
            store,
            shared,
        };

        // Pre-open minimum sessions
        for _ in 0..pool.config.min_idle {
            let session = pool.shared.open_session(&pool.store);
            pool.shared.idle().push_back(session);
        }

        Ok(pool)
    }

    /// Lease a session for the duration of one request
    ///
    /// Fails with [`ServiceError::Unavailable`] when the store is closed or no
    /// session frees up within `acquire_timeout`.
    pub async fn lease(&self) -> Result<SessionLease> {
        if !self.store.is_open() {
            return Err(ServiceError::Unavailable("document store is closed".into()));
        }

        let acquire = Arc::clone(&self.permits).acquire_owned();
        let permit = match tokio::time::timeout(self.config.acquire_timeout, acquire).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return Err(ServiceError::Unavailable("session pool is shut down".into()));
            }
            Err(_) => {
                return Err(ServiceError::Unavailable(
                    "session pool timeout: no sessions available".into(),
                ));
            }
        };

        let mut session = match self.shared.take_idle() {
            Some(session) => session,
            None => self.shared.open_session(&self.store),
        };
        session.refresh_last_used();
        trace!(session_id = session.id(), "session leased");

        Ok(SessionLease {
            session: Some(session),
            permit: Some(permit),
            shared: Arc::clone(&self.shared),
        })
    }

    /// Stop handing out sessions. Outstanding leases still release normally.
    pub fn shutdown(&self) {
        self.permits.close();
        let drained = {
            let mut idle = self.shared.idle();
            let n = idle.len();
            idle.clear();
            n
        };
        self.shared
            .total_sessions
            .fetch_sub(drained, Ordering::SeqCst);
        debug!(drained, "session pool shut down");
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let idle_sessions = self.shared.idle().len();
        let leased_sessions = self
            .config
            .max_sessions
            .saturating_sub(self.permits.available_permits());

        PoolStats {
            total_sessions: self.shared.total_sessions.load(Ordering::SeqCst),
            idle_sessions,
            leased_sessions,
            max_sessions: self.config.max_sessions,
        }
    }
}

/// Session pool statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub total_sessions: usize,
    pub idle_sessions: usize,
    pub leased_sessions: usize,
    pub max_sessions: usize,
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pool Stats: {}/{} leased, {} idle, max {}",
            self.leased_sessions, self.total_sessions, self.idle_sessions, self.max_sessions
        )
    }
}

/// RAII guard for a leased session
///
/// Returns the session to the pool on [`release`](Self::release) or when
/// dropped, whichever comes first. Releasing twice is a no-op.
#[derive(Debug)]
pub struct SessionLease {
    session: Option<StorageSession>,
    permit: Option<OwnedSemaphorePermit>,
    shared: Arc<PoolShared>,
}

impl SessionLease {
    /// The leased session, or an error once the lease was released
    pub fn session(&self) -> Result<&StorageSession> {
        self.session
            .as_ref()
            .ok_or(ServiceError::Storage(StoreError::Released))
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session.as_ref().map(StorageSession::id)
    }

    pub fn is_released(&self) -> bool {
        self.session.is_none()
    }

    pub fn release(&mut self) {
        if let Some(session) = self.session.take() {
            trace!(session_id = session.id(), "session released");
            self.shared.give_back(session);
        }
        // The slot frees only after the session is back in the idle queue.
        self.permit.take();
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.release();
    }
}
