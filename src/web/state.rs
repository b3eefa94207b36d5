use crate::auth::AuthResolver;
use crate::connection::pool::SessionPool;
use crate::service::{ProfileService, UserService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<SessionPool>,
    pub users: Arc<UserService>,
    pub profiles: Arc<ProfileService>,
    pub auth: Arc<AuthResolver>,
}

impl AppState {
    pub fn new(pool: Arc<SessionPool>) -> Self {
        Self {
            pool,
            users: Arc::new(UserService::new()),
            profiles: Arc::new(ProfileService::new()),
            auth: Arc::new(AuthResolver::new()),
        }
    }

    pub fn with_profiles(mut self, profiles: ProfileService) -> Self {
        self.profiles = Arc::new(profiles);
        self
    }
}
