//! Peer qualification: decide whether a connected peer falls under one
//! [`Acl`]'s peer list (§4.5).
//!
//! Grounded directly on the linear scan in `IsPeerQualifiedForAcl` in the
//! original permission manager: the peer list is walked in declaration
//! order and the first matcher that applies wins. `Peer::All` matches
//! unconditionally wherever it appears in the list — it is not required to
//! be first, despite what a hurried reading of the list's intent might
//! suggest.

use crate::peer::PeerState;
use crate::policy::{Acl, Peer};

/// The result of qualifying a peer against one ACL's peer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Qualification {
    /// Whether the peer falls under this ACL at all.
    pub qualifies: bool,
    /// Whether qualification was via an exact public-key match
    /// (`Peer::WithPublicKey`). The orchestrator uses this to decide
    /// whether explicit-deny scanning is enabled for the ACL (§4.6).
    pub via_public_key: bool,
}

impl Qualification {
    const NONE: Self = Self {
        qualifies: false,
        via_public_key: false,
    };
}

/// Qualify `peer` against `acl.peers`, first match wins.
#[must_use]
pub fn qualify_peer(acl: &Acl, peer: &PeerState) -> Qualification {
    for matcher in &acl.peers {
        match matcher {
            Peer::All => {
                return Qualification {
                    qualifies: true,
                    via_public_key: false,
                };
            }
            Peer::AnyTrusted => {
                if peer.trusted_auth_complete {
                    return Qualification {
                        qualifies: true,
                        via_public_key: false,
                    };
                }
            }
            Peer::WithPublicKey(key) => {
                if peer.trusted_auth_complete && peer.public_key == Some(*key) {
                    return Qualification {
                        qualifies: true,
                        via_public_key: true,
                    };
                }
            }
            Peer::FromCertificateAuthority(key) => {
                if peer.trusted_auth_complete && peer.issuer_chain.contains(key) {
                    return Qualification {
                        qualifies: true,
                        via_public_key: false,
                    };
                }
            }
            Peer::WithMembership { group_id, .. } => {
                if peer.trusted_auth_complete && peer.has_membership_in_group(group_id) {
                    return Qualification {
                        qualifies: true,
                        via_public_key: false,
                    };
                }
            }
        }
    }
    Qualification::NONE
}
