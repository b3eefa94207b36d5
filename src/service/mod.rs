//! Request-level operations exposed to the HTTP boundary.
//!
//! Every operation takes the [`RequestContext`](crate::context::RequestContext)
//! of the call. The `*_with` variants take an explicit store instead and
//! exist for embedding the services over other storage engines.

pub mod profile;
pub mod user;

pub use profile::{NO_PROFILE, PROFILE_LIST_LIMIT, ProfileService};
pub use user::{DUPLICATE_EMAIL, NO_USER, UserService};
