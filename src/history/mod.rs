pub mod differ;

pub use differ::{Clock, FixedClock, ProfileDiffer, SystemClock};
