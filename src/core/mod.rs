pub mod error;
pub mod types;

pub use error::{ErrorKind, Result, ServiceError};
pub use types::{ANONYMOUS_ID, Change, ChangedField, FieldValue, Identity, NewUser, Profile, User};
