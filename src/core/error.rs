use crate::storage::StoreError;
use std::fmt;
use thiserror::Error;

/// Classification of every failure the service can report.
///
/// The HTTP boundary maps each kind to a status code; everything below it
/// only needs to pick the right kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadInput,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Unavailable,
    Cancelled,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::BadInput => "bad_input",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Storage => "storage",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::BadInput(_) => ErrorKind::BadInput,
            ServiceError::Unauthorized(_) => ErrorKind::Unauthorized,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Unavailable(_) => ErrorKind::Unavailable,
            ServiceError::Cancelled => ErrorKind::Cancelled,
            ServiceError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// True for failures the caller cannot fix by changing the request.
    pub fn is_server_side(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unavailable | ErrorKind::Cancelled | ErrorKind::Storage
        )
    }

    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(ServiceError::bad_input("x").kind(), ErrorKind::BadInput);
        assert_eq!(ServiceError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(ServiceError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(
            ServiceError::from(StoreError::Closed).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_server_side_classification() {
        assert!(ServiceError::Unavailable("pool".into()).is_server_side());
        assert!(ServiceError::from(StoreError::Backend("disk".into())).is_server_side());
        assert!(!ServiceError::forbidden("nope").is_server_side());
        assert!(!ServiceError::Conflict("dup".into()).is_server_side());
    }

    #[test]
    fn test_storage_error_keeps_cause() {
        let err = ServiceError::from(StoreError::Backend("index corrupted".into()));
        assert!(err.to_string().contains("index corrupted"));
    }
}
