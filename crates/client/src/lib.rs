//! `erpdash-client`
//!
//! **Responsibility:** the dashboard's client-side session core.
//!
//! This crate provides:
//! - A tab-scoped session cache with a fixed TTL
//! - The auth controller (load, background revalidation, login/logout)
//! - Permission predicates and the permission-gated navigation tree
//!
//! The server stays the authority; everything here only gates rendering.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod navigation;
pub mod routes;
pub mod storage;
pub mod token;

#[cfg(feature = "http")]
pub mod http;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod frontend;

pub use api::{ApiError, AuthApi, Credentials};
pub use cache::{SessionCache, SessionCacheEntry, CACHE_KEY, CACHE_TTL};
pub use config::ClientConfig;
pub use controller::{
    AuthController, AuthSnapshot, AuthStatus, Collaborators, FetchKind, FetchOutcome, LoginError,
    PendingFetch,
};
pub use navigation::{dashboard_navigation, filter_tree, find_route, is_route_permitted, NavItem};
pub use routes::{LogNavigator, Navigator, Routes};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError, UnavailableStorage};
pub use token::{TokenAccessor, TokenPair, TokenStore, TOKEN_KEY};

pub use erpdash_auth::PermissionCheck;
