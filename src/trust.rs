//! Collaborator interfaces the orchestrator queries for facts this core
//! never derives itself: the session/authentication layer's view of a
//! peer, and whether the local device has any trust anchors installed at
//! all (§2 item 3, §4.8).
//!
//! This module defines traits only. Producing real answers — parsing
//! certificates, tracking handshake state, persisting trust anchors — is
//! out of scope for the authorization core and lives in the embedding
//! application.

use crate::peer::{PeerGuid, PeerState};

/// Supplies [`crate::orchestrator::authorize`] with the current state of a
/// connected peer, resolved by GUID on every call.
///
/// [`crate::peer::PeerRegistry`] implements this trait directly. An
/// embedder with additional session-layer bookkeeping (handshake progress
/// not yet reflected in the registry) can wrap it instead.
pub trait PeerStateProvider: Send + Sync {
    /// Look up the current state for `guid`. Returns `None` when the peer
    /// is unknown (not yet connected, or already torn down).
    fn peer_state(&self, guid: PeerGuid) -> Option<std::sync::Arc<PeerState>>;
}

/// Supplies the orchestrator with the device's claim status.
///
/// A device is "unclaimed" when it has no trust anchors installed — no
/// admin group, no identity certificate authority. Unclaimed devices are
/// open to the bus's standard claim flow (§4.8 step 2).
pub trait TrustAnchorStatus: Send + Sync {
    /// Returns `true` when at least one trust anchor (an admin group, or
    /// a permission-configurator identity certificate authority) is
    /// installed locally.
    fn is_claimed(&self) -> bool;

    /// The security group id of the local admin group, if claimed.
    fn admin_group_id(&self) -> Option<String>;
}
