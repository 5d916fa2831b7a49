//! Pending reservation storage.
//!
//! Holds at most one reservation per client fingerprint. Records expire
//! `ttl` after insertion; expiry is observed lazily by lookups and eagerly
//! by [`ReservationStore::sweep`], whichever comes first.

use gamecode_core::Fingerprint;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default reservation lifetime.
pub const DEFAULT_RESERVATION_TTL: Duration = Duration::from_secs(60);

/// Longest lifetime a store will hand out; larger TTLs are clamped to it.
pub const MAX_RESERVATION_TTL: Duration = Duration::from_secs(86_400 * 365);

/// Store-unique identifier of a single reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReservationId(u64);

impl ReservationId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A pending reservation (returned to callers as a snapshot).
#[derive(Debug, Clone)]
pub struct Reservation<S> {
    pub id: ReservationId,
    /// Fingerprint of the reserving client.
    pub owner: Fingerprint,
    /// Settings for the room to be created, stored verbatim.
    pub settings: S,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl<S> Reservation<S> {
    /// Whether the reservation is past its expiry at `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Fingerprint-keyed store of pending reservations.
///
/// Cloning is cheap and yields a handle to the same underlying map.
pub struct ReservationStore<S> {
    entries: Arc<RwLock<HashMap<Fingerprint, Reservation<S>>>>,
    next_id: Arc<AtomicU64>,
    ttl: Duration,
}

impl<S> Clone for ReservationStore<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            next_id: self.next_id.clone(),
            ttl: self.ttl,
        }
    }
}

impl<S: Clone + Send + Sync> Default for ReservationStore<S> {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVATION_TTL)
    }
}

impl<S: Clone + Send + Sync> ReservationStore<S> {
    /// Create an empty store whose reservations live for `ttl`, capped at
    /// [`MAX_RESERVATION_TTL`].
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            ttl: ttl.min(MAX_RESERVATION_TTL),
        }
    }

    /// Reservation lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or overwrite the reservation for `owner`.
    pub async fn put(&self, owner: Fingerprint, settings: S) -> ReservationId {
        self.put_at(owner, settings, Instant::now()).await
    }

    /// [`put`](Self::put) with an explicit insertion time.
    pub async fn put_at(&self, owner: Fingerprint, settings: S, now: Instant) -> ReservationId {
        let id = ReservationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let reservation = Reservation {
            id,
            owner: owner.clone(),
            settings,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut entries = self.entries.write().await;
        if let Some(previous) = entries.insert(owner, reservation) {
            debug!(
                client = %previous.owner.digest(),
                replaced = previous.id.get(),
                "reservation overwritten"
            );
        }
        id
    }

    /// Settings of the live reservation for `owner`, without consuming it.
    pub async fn peek(&self, owner: &Fingerprint) -> Option<S> {
        self.peek_at(owner, Instant::now()).await
    }

    /// [`peek`](Self::peek) evaluated at `now`.
    pub async fn peek_at(&self, owner: &Fingerprint, now: Instant) -> Option<S> {
        self.get_at(owner, now).await.map(|r| r.settings)
    }

    /// Snapshot of the live reservation for `owner`.
    ///
    /// An expired record is removed as a side effect and `None` returned.
    pub async fn get(&self, owner: &Fingerprint) -> Option<Reservation<S>> {
        self.get_at(owner, Instant::now()).await
    }

    /// [`get`](Self::get) evaluated at `now`.
    pub async fn get_at(&self, owner: &Fingerprint, now: Instant) -> Option<Reservation<S>> {
        let mut entries = self.entries.write().await;
        let expired = entries.get(owner)?.is_expired_at(now);
        if expired {
            entries.remove(owner);
            debug!(client = %owner.digest(), "reservation expired on lookup");
            return None;
        }
        entries.get(owner).cloned()
    }

    /// Remove any reservation for `owner`. Returns whether one was present.
    pub async fn consume(&self, owner: &Fingerprint) -> bool {
        self.entries.write().await.remove(owner).is_some()
    }

    /// Remove the reservation for `owner` only if it is still `id`.
    ///
    /// A reservation that was overwritten in the meantime is left alone.
    pub async fn consume_if(&self, owner: &Fingerprint, id: ReservationId) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(owner) {
            Some(current) if current.id == id => {
                entries.remove(owner);
                true
            }
            _ => false,
        }
    }

    /// Remove every reservation expired at `now`.
    ///
    /// Returns the fingerprints that were removed.
    pub async fn sweep(&self, now: Instant) -> Vec<Fingerprint> {
        let mut entries = self.entries.write().await;
        let mut removed = Vec::new();

        entries.retain(|owner, reservation| {
            if reservation.is_expired_at(now) {
                info!(client = %owner.digest(), "custom game code creation expired");
                removed.push(owner.clone());
                false
            } else {
                true
            }
        });

        if !removed.is_empty() {
            debug!(count = removed.len(), "sweep removed reservations");
        }

        removed
    }

    /// Number of records held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamecode_core::{fingerprint, ClientInfo, ModInfo};

    fn owner(name: &str) -> Fingerprint {
        fingerprint(&ClientInfo {
            remote_addr: "198.51.100.4".parse().unwrap(),
            username: name.into(),
            client_version: "2021.6.30".into(),
            platform: "StandaloneSteamPC".into(),
            language: 0,
            mods: vec![ModInfo::new("gg.reactor.api", "1.0.0")],
        })
    }

    #[tokio::test]
    async fn put_then_peek() {
        let store = ReservationStore::default();
        store.put(owner("alice"), "impostors=1").await;
        assert_eq!(store.peek(&owner("alice")).await, Some("impostors=1"));
        assert_eq!(store.peek(&owner("bob")).await, None);
    }

    #[tokio::test]
    async fn put_overwrites_previous_reservation() {
        let store = ReservationStore::default();
        let first = store.put(owner("alice"), 1).await;
        let second = store.put(owner("alice"), 2).await;

        assert_ne!(first, second);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.peek(&owner("alice")).await, Some(2));
    }

    #[tokio::test]
    async fn oversized_ttl_is_clamped() {
        let store = ReservationStore::new(Duration::MAX);
        assert_eq!(store.ttl(), MAX_RESERVATION_TTL);

        let t0 = Instant::now();
        store.put_at(owner("alice"), 1, t0).await;
        let reservation = store.get_at(&owner("alice"), t0).await.unwrap();
        assert_eq!(reservation.expires_at, t0 + MAX_RESERVATION_TTL);
    }

    #[tokio::test]
    async fn peek_is_repeatable() {
        let store = ReservationStore::default();
        store.put(owner("alice"), vec![1, 2, 3]).await;
        let a = store.peek(&owner("alice")).await;
        let b = store.peek(&owner("alice")).await;
        assert_eq!(a, Some(vec![1, 2, 3]));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn peek_honors_ttl_boundary() {
        let store = ReservationStore::new(Duration::from_secs(60));
        let t0 = Instant::now();
        store.put_at(owner("alice"), "s", t0).await;

        let just_before = t0 + Duration::from_secs(60) - Duration::from_millis(1);
        assert_eq!(store.peek_at(&owner("alice"), just_before).await, Some("s"));

        let just_after = t0 + Duration::from_secs(60) + Duration::from_millis(1);
        assert_eq!(store.peek_at(&owner("alice"), just_after).await, None);
        // Lazy expiry removed the record.
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn expiry_is_inclusive_of_deadline() {
        let store = ReservationStore::new(Duration::from_secs(60));
        let t0 = Instant::now();
        store.put_at(owner("alice"), "s", t0).await;
        let deadline = t0 + Duration::from_secs(60);
        assert_eq!(store.peek_at(&owner("alice"), deadline).await, None);
    }

    #[tokio::test]
    async fn consume_is_idempotent() {
        let store = ReservationStore::default();
        store.put(owner("alice"), ()).await;
        assert!(store.consume(&owner("alice")).await);
        assert!(!store.consume(&owner("alice")).await);
        assert_eq!(store.peek(&owner("alice")).await, None);
    }

    #[tokio::test]
    async fn consume_if_skips_newer_reservation() {
        let store = ReservationStore::default();
        let stale = store.put(owner("alice"), "old").await;
        store.put(owner("alice"), "new").await;

        assert!(!store.consume_if(&owner("alice"), stale).await);
        assert_eq!(store.peek(&owner("alice")).await, Some("new"));

        let current = store.get(&owner("alice")).await.unwrap().id;
        assert!(store.consume_if(&owner("alice"), current).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn get_returns_full_snapshot() {
        let store = ReservationStore::new(Duration::from_secs(30));
        let t0 = Instant::now();
        let id = store.put_at(owner("alice"), "s", t0).await;

        let snapshot = store.get_at(&owner("alice"), t0).await.unwrap();
        assert_eq!(snapshot.id, id);
        assert_eq!(snapshot.owner, owner("alice"));
        assert_eq!(snapshot.created_at, t0);
        assert_eq!(snapshot.expires_at, t0 + Duration::from_secs(30));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let store = ReservationStore::new(Duration::from_secs(60));
        let t0 = Instant::now();
        store.put_at(owner("alice"), "a", t0).await;
        store
            .put_at(owner("bob"), "b", t0 + Duration::from_secs(30))
            .await;

        let removed = store.sweep(t0 + Duration::from_secs(60)).await;
        assert_eq!(removed, vec![owner("alice")]);
        assert_eq!(store.len().await, 1);

        let removed = store.sweep(t0 + Duration::from_secs(90)).await;
        assert_eq!(removed, vec![owner("bob")]);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_on_empty_store_is_noop() {
        let store: ReservationStore<()> = ReservationStore::default();
        assert!(store.sweep(Instant::now()).await.is_empty());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = ReservationStore::default();
        let handle = store.clone();
        store.put(owner("alice"), 5u8).await;
        assert_eq!(handle.peek(&owner("alice")).await, Some(5));
    }
}
