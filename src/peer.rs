//! The peer state registry: one mutable record per connected remote
//! identity (§3.2, §5).
//!
//! `PeerState` itself is an immutable snapshot — updates (a completed
//! handshake, a manifest exchange, a membership refresh) build a new
//! `PeerState` and swap the whole `Arc` held by the registry, rather than
//! mutating fields in place. An evaluation that cloned the `Arc` before an
//! update is unaffected by it.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::policy::{EccKey, Rule};
use crate::trust::PeerStateProvider;

/// A connected peer's unique identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerGuid(pub Uuid);

impl PeerGuid {
    /// Generate a fresh, random peer GUID.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

/// One membership (security group) certificate chain held by a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipCert {
    /// The security group this certificate was issued to.
    pub group_id: String,
    /// The certificate's issuer chain, leaf first.
    pub chain: Vec<EccKey>,
}

/// Per-peer connection state (§3.2).
///
/// Created when a remote identity is first observed; replaced wholesale
/// (never mutated field-by-field) as the authentication and manifest
/// exchange steps complete; removed when the session tears down.
#[derive(Debug, Clone, Default)]
pub struct PeerState {
    /// Negotiated authentication mechanism name (e.g. `"ALLJOYN_ECDHE_ECDSA"`,
    /// `"ALLJOYN_ECDHE_PSK"`, `"ALLJOYN_SRP_KEYX"`, `"ALLJOYN_PIN_KEYX"`).
    /// Empty when no handshake has completed yet.
    pub auth_mechanism: String,
    /// `true` once a trusted authentication handshake has completed.
    pub trusted_auth_complete: bool,
    /// The peer's public key, once known (certificate-based mechanisms
    /// only).
    pub public_key: Option<EccKey>,
    /// The issuing chain for `public_key`, root last.
    pub issuer_chain: Vec<EccKey>,
    /// Membership certificates the peer has presented, keyed by
    /// certificate serial.
    pub memberships: std::collections::HashMap<String, Vec<MembershipCert>>,
    /// The peer's signed manifest — the rights it claims to hold (§4.7).
    pub manifest: Vec<Rule>,
}

impl PeerState {
    /// A freshly observed peer: no handshake, no manifest.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Returns `true` when the peer holds a membership certificate whose
    /// leaf (first) chain entry was issued to `group_id`.
    #[must_use]
    pub fn has_membership_in_group(&self, group_id: &str) -> bool {
        self.memberships
            .values()
            .any(|chains| chains.first().is_some_and(|cert| cert.group_id == group_id))
    }
}

/// The concurrent registry of connected peers, keyed by GUID.
///
/// `dashmap` shards its internal locking, giving effectively per-peer
/// granularity without a single global mutex (§5); the registry lock is
/// only ever held for the duration of an insert/remove/lookup, never while
/// an evaluation is in flight.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: DashMap<PeerGuid, Arc<PeerState>>,
}

impl PeerRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
        }
    }

    /// Record a newly observed peer, replacing any prior state for the
    /// same GUID.
    pub fn insert(&self, guid: PeerGuid, state: PeerState) {
        self.peers.insert(guid, Arc::new(state));
    }

    /// Borrow the current state for `guid`, if the peer is still
    /// connected.
    #[must_use]
    pub fn get(&self, guid: PeerGuid) -> Option<Arc<PeerState>> {
        self.peers.get(&guid).map(|entry| Arc::clone(&entry))
    }

    /// Replace the state for `guid` wholesale (handshake completion,
    /// manifest exchange, membership refresh).
    pub fn update(&self, guid: PeerGuid, state: PeerState) {
        self.peers.insert(guid, Arc::new(state));
    }

    /// Drop a peer's state once its session has fully torn down.
    pub fn remove(&self, guid: PeerGuid) {
        self.peers.remove(&guid);
    }

    /// The number of currently tracked peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the registry currently tracks no peers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl PeerStateProvider for PeerRegistry {
    fn peer_state(&self, guid: PeerGuid) -> Option<Arc<PeerState>> {
        self.get(guid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(group_id: &str) -> MembershipCert {
        MembershipCert {
            group_id: group_id.to_string(),
            chain: vec![EccKey::new([7; 32])],
        }
    }

    #[test]
    fn has_membership_in_group_checks_leaf_group() {
        let mut state = PeerState::unauthenticated();
        state
            .memberships
            .insert("serial-1".to_string(), vec![cert("admins")]);
        assert!(state.has_membership_in_group("admins"));
        assert!(!state.has_membership_in_group("guests"));
    }

    #[test]
    fn has_membership_in_group_ignores_non_leaf_chain_entries() {
        let mut state = PeerState::unauthenticated();
        // two certs in the chain for one serial: leaf is "guests", a later
        // (non-leaf) entry happens to name "admins" — only the leaf counts.
        state.memberships.insert(
            "serial-1".to_string(),
            vec![cert("guests"), cert("admins")],
        );
        assert!(!state.has_membership_in_group("admins"));
        assert!(state.has_membership_in_group("guests"));
    }

    #[test]
    fn unauthenticated_peer_has_no_memberships() {
        let state = PeerState::unauthenticated();
        assert!(!state.has_membership_in_group("anything"));
    }

    #[test]
    fn registry_insert_get_remove_round_trips() {
        let registry = PeerRegistry::new();
        let guid = PeerGuid::new_random();
        assert!(registry.get(guid).is_none());

        registry.insert(guid, PeerState::unauthenticated());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(guid).is_some());

        registry.remove(guid);
        assert!(registry.get(guid).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_update_replaces_whole_state() {
        let registry = PeerRegistry::new();
        let guid = PeerGuid::new_random();
        registry.insert(guid, PeerState::unauthenticated());

        let mut authenticated = PeerState::unauthenticated();
        authenticated.auth_mechanism = "ALLJOYN_ECDHE_ECDSA".to_string();
        authenticated.trusted_auth_complete = true;
        authenticated.public_key = Some(EccKey::new([1; 32]));
        registry.update(guid, authenticated);

        let observed = registry.get(guid).unwrap();
        assert!(observed.trusted_auth_complete);
        assert_eq!(observed.auth_mechanism, "ALLJOYN_ECDHE_ECDSA");
    }

    #[test]
    fn registry_satisfies_peer_state_provider() {
        let registry = PeerRegistry::new();
        let guid = PeerGuid::new_random();
        registry.insert(guid, PeerState::unauthenticated());

        let provider: &dyn PeerStateProvider = &registry;
        assert!(provider.peer_state(guid).is_some());
        assert!(provider.peer_state(PeerGuid::new_random()).is_none());
    }

    #[test]
    fn a_cloned_arc_is_unaffected_by_a_later_update() {
        let registry = PeerRegistry::new();
        let guid = PeerGuid::new_random();
        registry.insert(guid, PeerState::unauthenticated());

        let snapshot = registry.get(guid).unwrap();
        assert!(!snapshot.trusted_auth_complete);

        let mut updated = PeerState::unauthenticated();
        updated.trusted_auth_complete = true;
        registry.update(guid, updated);

        // the earlier Arc clone still observes the pre-update value.
        assert!(!snapshot.trusted_auth_complete);
        assert!(registry.get(guid).unwrap().trusted_auth_complete);
    }
}
