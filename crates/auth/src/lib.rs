//! `erpdash-auth`: the client's local authorization model.
//!
//! Pure data and predicates: no HTTP, no storage, no clocks. The server is the
//! authority of record; everything here only decides what the UI renders.

pub mod authorize;
pub mod permissions;
pub mod roles;
pub mod snapshot;
pub mod user;

pub use authorize::{authorize, requirement_met, AuthzError, PermissionCheck};
pub use permissions::{catalog, Permission, PermissionCode, PermissionModule};
pub use roles::{Role, RoleLevel};
pub use snapshot::PermissionSnapshot;
pub use user::User;
