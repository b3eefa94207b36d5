use crate::context::RequestContext;
use crate::core::{NewUser, Result, ServiceError};
use crate::storage::{StoreError, UserStore};
use tracing::info;

pub const NO_USER: &str = "user not found";
pub const DUPLICATE_EMAIL: &str = "user with this email already exists";

const MAX_EMAIL_LEN: usize = 254;

/// Registration and confirmation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        Self
    }

    /// Registers an unconfirmed user and returns its id.
    pub async fn create(&self, ctx: &RequestContext, new_user: NewUser) -> Result<String> {
        ctx.ensure_active()?;
        self.create_with(ctx.session()?, new_user).await
    }

    pub async fn create_with<S>(&self, store: &S, new_user: NewUser) -> Result<String>
    where
        S: UserStore + ?Sized,
    {
        let email = new_user.email.trim();
        validate_email(email)?;
        validate_password(&new_user.password)?;

        let user = store
            .insert_user(email, &new_user.password)
            .await
            .map_err(|err| match err {
                StoreError::Duplicate(_) => ServiceError::Conflict(DUPLICATE_EMAIL.to_string()),
                other => ServiceError::Storage(other),
            })?;

        info!(user_id = %user.id, "user registered");
        Ok(user.id)
    }

    /// Confirms a pending user and returns the id of its profile.
    ///
    /// Confirming twice fails: only an unconfirmed user matches.
    pub async fn confirm(&self, ctx: &RequestContext, user_id: &str) -> Result<String> {
        ctx.ensure_active()?;
        self.confirm_with(ctx.session()?, user_id).await
    }

    pub async fn confirm_with<S>(&self, store: &S, user_id: &str) -> Result<String>
    where
        S: UserStore + ?Sized,
    {
        let user = store
            .confirm_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(NO_USER))?;

        info!(user_id = %user.id, "user confirmed");
        Ok(user.id)
    }
}

fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(ServiceError::bad_input("email cannot be empty"));
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ServiceError::bad_input(format!(
            "email too long (max {} characters)",
            MAX_EMAIL_LEN
        )));
    }

    if !email.contains('@') {
        return Err(ServiceError::bad_input("email must contain '@'"));
    }

    // Basic auth splits the pair at the first ':'.
    if email.contains(':') {
        return Err(ServiceError::bad_input("email cannot contain ':'"));
    }

    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(ServiceError::bad_input("password cannot be empty"));
    }

    Ok(())
}
