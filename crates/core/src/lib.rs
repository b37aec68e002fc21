//! `erpdash-core`: primitives shared by the dashboard client crates.
//!
//! Nothing in here performs I/O.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{RoleId, UserId};
