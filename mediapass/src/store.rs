//! The in-memory token registry

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use mediapass_clock::UnixTime;
use parking_lot::RwLock;
use serde::Serialize;

use crate::{AccessToken, AccessTokenRef, Binding};

/// Issuance statistics for a token store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Number of tokens ever inserted, including those since evicted
    #[serde(rename = "totalEverIssued")]
    pub total_issued: u64,
    /// Number of tokens that have not yet expired
    pub active: usize,
}

/// The outcome of looking a token up in the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// No entry exists for the token
    Missing,
    /// An entry exists but its binding has expired
    Expired(Arc<Binding>),
    /// An entry exists and is still valid
    Active(Arc<Binding>),
}

#[derive(Debug, Default)]
struct Inner {
    entries: RwLock<HashMap<AccessToken, Arc<Binding>>>,
    total_issued: AtomicU64,
}

/// A process-lifetime registry mapping tokens to their bindings
///
/// Cloning the store produces another handle to the same registry.
///
/// Reads apply lazy expiry: an entry whose binding has expired is reported
/// as absent by [`get`][TokenStore::get] and excluded from
/// [`count_active`][TokenStore::count_active], even before a sweep
/// physically removes it.
///
/// Tokens are assumed unique given their entropy width; inserting a token
/// that is already present replaces its binding.
#[derive(Clone, Debug, Default)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

impl TokenStore {
    /// Constructs a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token with its binding
    pub fn insert(&self, token: AccessToken, binding: Binding) {
        let expiry = binding.expiry();
        self.inner
            .entries
            .write()
            .insert(token, Arc::new(binding));
        self.inner.total_issued.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(expiry = expiry.0, "token registered");
    }

    /// Gets the binding for a token, if it exists and has not expired as of `now`
    pub fn get(&self, token: &AccessTokenRef, now: UnixTime) -> Option<Arc<Binding>> {
        match self.lookup(token, now) {
            Lookup::Active(binding) => Some(binding),
            Lookup::Missing | Lookup::Expired(_) => None,
        }
    }

    /// Looks up a token, distinguishing expired entries from missing ones
    pub fn lookup(&self, token: &AccessTokenRef, now: UnixTime) -> Lookup {
        match self.inner.entries.read().get(token) {
            None => Lookup::Missing,
            Some(binding) if binding.is_expired_at(now) => Lookup::Expired(Arc::clone(binding)),
            Some(binding) => Lookup::Active(Arc::clone(binding)),
        }
    }

    /// Removes a token, returning its binding if it was present
    pub fn delete(&self, token: &AccessTokenRef) -> Option<Arc<Binding>> {
        let removed = self.inner.entries.write().remove(token);
        if removed.is_some() {
            tracing::trace!("token removed");
        }
        removed
    }

    /// Removes a token only if it is still present and expired as of `now`
    ///
    /// Returns whether an entry was removed.
    pub fn evict_if_expired(&self, token: &AccessTokenRef, now: UnixTime) -> bool {
        let mut entries = self.inner.entries.write();
        let expired = entries
            .get(token)
            .map_or(false, |binding| binding.is_expired_at(now));
        if expired {
            entries.remove(token);
            tracing::trace!("expired token evicted");
        }
        expired
    }

    /// Removes every entry that has expired as of `now`
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self, now: UnixTime) -> usize {
        let mut entries = self.inner.entries.write();
        let before = entries.len();
        entries.retain(|_, binding| !binding.is_expired_at(now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::trace!(removed, remaining = entries.len(), "swept expired tokens");
        }
        removed
    }

    /// Number of entries that have not expired as of `now`
    pub fn count_active(&self, now: UnixTime) -> usize {
        self.inner
            .entries
            .read()
            .values()
            .filter(|binding| !binding.is_expired_at(now))
            .count()
    }

    /// Number of entries that have not expired as of `now`
    ///
    /// Equivalent to [`count_active`][TokenStore::count_active].
    #[inline]
    pub fn size(&self, now: UnixTime) -> usize {
        self.count_active(now)
    }

    /// Number of entries physically held, including expired entries that
    /// have not yet been swept
    pub fn physical_len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Number of tokens ever inserted into this store
    pub fn total_issued(&self) -> u64 {
        self.inner.total_issued.load(Ordering::Relaxed)
    }

    /// Issuance statistics as of `now`
    pub fn stats(&self, now: UnixTime) -> Stats {
        Stats {
            total_issued: self.total_issued(),
            active: self.count_active(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use mediapass_clock::DurationSecs;

    use super::*;
    use crate::{RequesterId, ResourcePath};

    fn binding(issued: u64) -> Binding {
        Binding::new(
            ResourcePath::new("/audio/track.mp3".to_owned()).unwrap(),
            RequesterId::new("listener_1".to_owned()).unwrap(),
            UnixTime(issued),
            DurationSecs(120),
        )
    }

    fn token(s: &'static str) -> AccessToken {
        AccessToken::from_static(s)
    }

    #[test]
    fn get_returns_inserted_binding() {
        let store = TokenStore::new();
        store.insert(token("a"), binding(100));

        let found = store.get(AccessTokenRef::from_str("a"), UnixTime(150)).unwrap();
        assert_eq!(*found, binding(100));
        assert!(store.get(AccessTokenRef::from_str("b"), UnixTime(150)).is_none());
    }

    #[test]
    fn expired_entry_is_absent_before_sweep() {
        let store = TokenStore::new();
        store.insert(token("a"), binding(100));

        let key = AccessTokenRef::from_str("a");
        assert!(store.get(key, UnixTime(220)).is_some());
        assert!(store.get(key, UnixTime(221)).is_none());
        assert!(matches!(store.lookup(key, UnixTime(221)), Lookup::Expired(_)));
        assert_eq!(store.physical_len(), 1);
        assert_eq!(store.size(UnixTime(221)), 0);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let store = TokenStore::new();
        store.insert(token("old"), binding(0));
        store.insert(token("older"), binding(10));
        store.insert(token("new"), binding(200));

        assert_eq!(store.sweep_expired(UnixTime(250)), 2);
        assert_eq!(store.physical_len(), 1);
        assert!(store.get(AccessTokenRef::from_str("new"), UnixTime(250)).is_some());
        assert_eq!(store.sweep_expired(UnixTime(250)), 0);
    }

    #[test]
    fn delete_reports_presence() {
        let store = TokenStore::new();
        store.insert(token("a"), binding(0));

        assert!(store.delete(AccessTokenRef::from_str("a")).is_some());
        assert!(store.delete(AccessTokenRef::from_str("a")).is_none());
    }

    #[test]
    fn evict_if_expired_keeps_live_entries() {
        let store = TokenStore::new();
        store.insert(token("a"), binding(100));
        let key = AccessTokenRef::from_str("a");

        assert!(!store.evict_if_expired(key, UnixTime(200)));
        assert_eq!(store.physical_len(), 1);
        assert!(store.evict_if_expired(key, UnixTime(500)));
        assert_eq!(store.physical_len(), 0);
        assert!(!store.evict_if_expired(key, UnixTime(500)));
    }

    #[test]
    fn total_issued_survives_eviction() {
        let store = TokenStore::new();
        store.insert(token("a"), binding(0));
        store.insert(token("b"), binding(0));
        store.insert(token("c"), binding(1_000));
        store.sweep_expired(UnixTime(500));
        store.delete(AccessTokenRef::from_str("c"));

        assert_eq!(
            store.stats(UnixTime(500)),
            Stats {
                total_issued: 3,
                active: 0
            }
        );
    }

    #[test]
    fn clones_share_entries() {
        let store = TokenStore::new();
        let handle = store.clone();
        handle.insert(token("a"), binding(0));

        assert_eq!(store.count_active(UnixTime(0)), 1);
        assert_eq!(store.total_issued(), 1);
    }

    #[test]
    fn stats_serialize_with_interface_names() {
        let stats = Stats {
            total_issued: 4,
            active: 2,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json, serde_json::json!({ "totalEverIssued": 4, "active": 2 }));
    }
}
