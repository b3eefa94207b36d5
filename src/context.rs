//! Per-request context.
//!
//! A [`RequestContext`] is created for every inbound call. It owns the leased
//! storage session, the caller's [`Identity`] and the request's path
//! parameters, and can be cancelled from outside. Dropping it releases the
//! lease, so every exit path gives the session back.

use crate::connection::StorageSession;
use crate::connection::pool::SessionLease;
use crate::core::{Identity, Result, ServiceError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Observes whether a request was cancelled.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the request is cancelled or its canceller is gone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Cancels the request it was taken from.
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

fn cancellation_pair() -> (Canceller, CancellationToken) {
    let (tx, rx) = watch::channel(false);
    (Canceller { tx: Arc::new(tx) }, CancellationToken { rx })
}

#[derive(Debug)]
pub struct RequestContext {
    request_id: Uuid,
    identity: Identity,
    params: HashMap<String, String>,
    lease: SessionLease,
    canceller: Canceller,
    token: CancellationToken,
}

impl RequestContext {
    /// New anonymous context around a freshly leased session.
    pub fn new(lease: SessionLease) -> Self {
        let (canceller, token) = cancellation_pair();
        Self {
            request_id: Uuid::new_v4(),
            identity: Identity::anonymous(),
            params: HashMap::new(),
            lease,
            canceller,
            token,
        }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Attach the authenticated identity, replacing the anonymous default.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Path parameter by name; a missing one is the caller's fault.
    pub fn param(&self, name: &str) -> Result<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ServiceError::bad_input(format!("missing parameter '{}'", name)))
    }

    pub fn session(&self) -> Result<&StorageSession> {
        self.lease.session()
    }

    pub fn lease(&self) -> &SessionLease {
        &self.lease
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fails with [`ServiceError::Cancelled`] once the request was cancelled.
    pub fn ensure_active(&self) -> Result<()> {
        ensure_active(&self.token)
    }

    /// Give the session back before the context itself goes away.
    pub fn release(&mut self) {
        self.lease.release();
    }
}

pub(crate) fn ensure_active(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(ServiceError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::config::PoolConfig;
    use crate::connection::pool::SessionPool;
    use crate::core::ErrorKind;
    use crate::storage::MemoryStore;
    use std::time::Duration;

    fn pool() -> SessionPool {
        SessionPool::new(PoolConfig::new(), Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn test_context_defaults_to_anonymous() {
        let pool = pool();
        let ctx = RequestContext::new(pool.lease().await.unwrap());

        assert!(ctx.identity().is_anonymous());
        assert!(ctx.session().is_ok());
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_identity_and_params() {
        let pool = pool();
        let mut params = HashMap::new();
        params.insert("profile_id".to_string(), "p-1".to_string());

        let ctx = RequestContext::new(pool.lease().await.unwrap())
            .with_params(params)
            .with_identity(Identity::new("u-1", "a@mail.com", true));

        assert_eq!(ctx.identity().id(), "u-1");
        assert_eq!(ctx.param("profile_id").unwrap(), "p-1");
        assert_eq!(
            ctx.param("user_id").unwrap_err().kind(),
            ErrorKind::BadInput
        );
    }

    #[tokio::test]
    async fn test_cancel_is_observed() {
        let pool = pool();
        let ctx = RequestContext::new(pool.lease().await.unwrap());
        let token = ctx.token().clone();

        let waiter = tokio::spawn(async move { token.cancelled().await });
        ctx.canceller().cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.ensure_active().unwrap_err().kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_drop_releases_lease() {
        let pool = pool();
        let baseline = pool.stats();

        let ctx = RequestContext::new(pool.lease().await.unwrap());
        assert_eq!(pool.stats().leased_sessions, 1);
        drop(ctx);

        assert_eq!(pool.stats(), baseline);
    }

    #[tokio::test]
    async fn test_cancelled_context_still_releases() {
        let pool = pool();
        let baseline = pool.stats();

        let mut ctx = RequestContext::new(pool.lease().await.unwrap());
        ctx.cancel();
        ctx.release();
        assert!(ctx.session().is_err());
        drop(ctx);

        assert_eq!(pool.stats(), baseline);
    }
}
