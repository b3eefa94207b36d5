use crate::core::{Identity, Result, ServiceError};
use crate::storage::UserStore;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::fmt;
use tracing::debug;

const BASIC_PREFIX: &str = "Basic ";

/// A `name:secret` pair as sent with basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    name: String,
    secret: String,
}

impl Credentials {
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
        }
    }

    /// Parses a decoded `name:secret` pair. Only the first `:` separates.
    pub fn parse(pair: &str) -> Result<Self> {
        let (name, secret) = pair
            .split_once(':')
            .ok_or_else(|| unauthorized("credential pair must be 'name:secret'"))?;
        Ok(Self::new(name, secret))
    }

    /// Extracts credentials from an `Authorization: Basic <base64>` value.
    pub fn from_authorization(header: Option<&str>) -> Result<Self> {
        let header = header.ok_or_else(|| unauthorized("missing credentials"))?;
        let encoded = header
            .strip_prefix(BASIC_PREFIX)
            .ok_or_else(|| unauthorized("expected basic authentication"))?;
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| unauthorized("credentials are not valid base64"))?;
        let pair =
            String::from_utf8(decoded).map_err(|_| unauthorized("credentials are not UTF-8"))?;
        Self::parse(&pair)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Header value for these credentials.
    pub fn to_authorization(&self) -> String {
        format!(
            "{}{}",
            BASIC_PREFIX,
            STANDARD.encode(format!("{}:{}", self.name, self.secret))
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("secret", &"***")
            .finish()
    }
}

fn unauthorized(message: &str) -> ServiceError {
    ServiceError::Unauthorized(message.to_string())
}

/// Turns request credentials into an [`Identity`].
///
/// Malformed or absent credentials are `Unauthorized`; well-formed ones that
/// match no confirmed user are `Forbidden`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthResolver;

impl AuthResolver {
    pub fn new() -> Self {
        Self
    }

    pub async fn resolve<S>(&self, store: &S, credentials: &Credentials) -> Result<Identity>
    where
        S: UserStore + ?Sized,
    {
        let user = store
            .find_user_by_credentials(credentials.name(), credentials.secret())
            .await?;

        match user {
            Some(user) if user.confirmed => Ok(Identity::from(&user)),
            Some(_) => {
                debug!(email = credentials.name(), "unconfirmed user tried to authenticate");
                Err(ServiceError::forbidden("account is not confirmed"))
            }
            None => {
                debug!(email = credentials.name(), "credentials did not match");
                Err(ServiceError::forbidden("invalid credentials"))
            }
        }
    }

    /// Resolves straight from an `Authorization` header value.
    pub async fn resolve_header<S>(&self, store: &S, header: Option<&str>) -> Result<Identity>
    where
        S: UserStore + ?Sized,
    {
        let credentials = Credentials::from_authorization(header)?;
        self.resolve(store, &credentials).await
    }
}
