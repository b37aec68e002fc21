//! Session snapshot cache (tab-scoped, best-effort).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use erpdash_auth::{PermissionSnapshot, User};
use erpdash_core::Clock;

use crate::storage::KeyValueStorage;

/// Storage key of the cached snapshot.
pub const CACHE_KEY: &str = "cached_auth";

/// Age after which a cached snapshot is stale.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// What the cache stores: the last successfully fetched session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCacheEntry {
    pub user: User,
    pub permissions: PermissionSnapshot,
    /// Epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    user: &'a User,
    permissions: &'a PermissionSnapshot,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
}

/// `now - timestamp < ttl`. Entries stamped in the future are never fresh.
pub fn is_fresh(entry: &SessionCacheEntry, now: DateTime<Utc>, ttl: Duration) -> bool {
    match now.signed_duration_since(entry.timestamp).to_std() {
        Ok(age) => age < ttl,
        Err(_) => false,
    }
}

/// Single-entry cache of the current session under [`CACHE_KEY`].
///
/// Caching is an optimization only: no method returns an error or panics.
/// Storage and parse failures are logged and read back as a miss.
#[derive(Clone)]
pub struct SessionCache {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
}

impl SessionCache {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Store `{user, permissions, now}`, replacing any previous entry.
    pub fn write(&self, user: &User, permissions: &PermissionSnapshot) {
        let entry = EntryRef {
            user,
            permissions,
            timestamp: self.clock.now(),
        };
        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!("failed to serialize session cache entry: {err}");
                return;
            }
        };
        if let Err(err) = self.storage.set(CACHE_KEY, &payload) {
            tracing::warn!("failed to write session cache: {err}");
        }
    }

    /// The stored entry regardless of age.
    pub fn read(&self) -> Option<SessionCacheEntry> {
        let raw = match self.storage.get(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("failed to read session cache: {err}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!("ignoring unreadable session cache entry: {err}");
                None
            }
        }
    }

    pub fn is_fresh(&self, entry: &SessionCacheEntry) -> bool {
        is_fresh(entry, self.clock.now(), CACHE_TTL)
    }

    /// The stored entry if it is younger than [`CACHE_TTL`].
    pub fn read_fresh(&self) -> Option<SessionCacheEntry> {
        self.read().filter(|entry| self.is_fresh(entry))
    }

    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(CACHE_KEY) {
            tracing::warn!("failed to clear session cache: {err}");
        }
    }
}

impl core::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionCache")
            .field("key", &CACHE_KEY)
            .field("ttl", &CACHE_TTL)
            .finish_non_exhaustive()
    }
}
