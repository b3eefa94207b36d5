//! Who is calling, and may they touch this resource.

pub mod guard;
pub mod resolver;

pub use guard::{AccessGuard, OwnerGuard};
pub use resolver::{AuthResolver, Credentials};
