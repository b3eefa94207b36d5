use crate::auth::{AccessGuard, OwnerGuard};
use crate::context::{CancellationToken, RequestContext, ensure_active};
use crate::core::{Change, Identity, Profile, Result, ServiceError};
use crate::history::ProfileDiffer;
use crate::storage::{HistoryStore, ProfileStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upper bound on profiles returned by a listing.
pub const PROFILE_LIST_LIMIT: usize = 1000;

pub const NO_PROFILE: &str = "profile not found";

/// Guarded profile reads, updates and history.
///
/// Reads of a single profile or the listing are public. Updates and history
/// require the caller to own the profile; a denial is reported as
/// [`ServiceError::Forbidden`] and left to the boundary to disguise.
pub struct ProfileService {
    guard: Arc<dyn AccessGuard>,
    differ: ProfileDiffer,
}

impl ProfileService {
    pub fn new() -> Self {
        Self::with_parts(Arc::new(OwnerGuard), ProfileDiffer::new())
    }

    pub fn with_parts(guard: Arc<dyn AccessGuard>, differ: ProfileDiffer) -> Self {
        Self { guard, differ }
    }

    pub async fn get(&self, ctx: &RequestContext, profile_id: &str) -> Result<Profile> {
        ctx.ensure_active()?;
        self.get_with(ctx.session()?, profile_id).await
    }

    pub async fn get_with<S>(&self, store: &S, profile_id: &str) -> Result<Profile>
    where
        S: ProfileStore + ?Sized,
    {
        store
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(NO_PROFILE))
    }

    /// Confirmed profiles, at most [`PROFILE_LIST_LIMIT`] of them.
    pub async fn all(&self, ctx: &RequestContext) -> Result<Vec<Profile>> {
        ctx.ensure_active()?;
        Ok(ctx.session()?.list_profiles(PROFILE_LIST_LIMIT).await?)
    }

    pub async fn update(&self, ctx: &RequestContext, incoming: Profile) -> Result<Profile> {
        self.update_with(ctx.session()?, ctx.identity(), ctx.token(), incoming)
            .await
    }

    /// Ownership check, diff, then history before profile.
    ///
    /// An update that changes nothing succeeds without writing anything.
    pub async fn update_with<S>(
        &self,
        store: &S,
        identity: &Identity,
        token: &CancellationToken,
        incoming: Profile,
    ) -> Result<Profile>
    where
        S: ProfileStore + HistoryStore + ?Sized,
    {
        ensure_active(token)?;
        self.authorize(identity, &incoming.id)?;

        let stored = self.get_with(store, &incoming.id).await?;

        let change = self.differ.diff(&stored, &incoming);
        if change.is_empty() {
            debug!(profile_id = %incoming.id, "update changed nothing");
            return Ok(stored);
        }

        ensure_active(token)?;
        // History goes first: a failure between the two writes leaves an
        // audited change that was never applied, not an unaudited one.
        store.append(&incoming.id, &change).await?;
        store.put_profile(&incoming).await?;

        info!(
            profile_id = %incoming.id,
            changed = change.len(),
            "profile updated"
        );
        Ok(incoming)
    }

    pub async fn history(&self, ctx: &RequestContext, profile_id: &str) -> Result<Vec<Change>> {
        self.history_with(ctx.session()?, ctx.identity(), ctx.token(), profile_id)
            .await
    }

    pub async fn history_with<S>(
        &self,
        store: &S,
        identity: &Identity,
        token: &CancellationToken,
        profile_id: &str,
    ) -> Result<Vec<Change>>
    where
        S: ProfileStore + HistoryStore + ?Sized,
    {
        ensure_active(token)?;
        self.authorize(identity, profile_id)?;

        self.get_with(store, profile_id).await?;
        Ok(store.list(profile_id).await?)
    }

    fn authorize(&self, identity: &Identity, owner_id: &str) -> Result<()> {
        if self.guard.allow(identity, owner_id) {
            return Ok(());
        }

        if identity.is_anonymous() {
            debug!(owner_id, "anonymous caller denied");
        } else {
            warn!(caller = identity.id(), owner_id, "caller denied access to foreign profile");
        }
        Err(ServiceError::forbidden("caller does not own this profile"))
    }
}

impl Default for ProfileService {
    fn default() -> Self {
        Self::new()
    }
}
