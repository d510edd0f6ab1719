//! The authorization orchestrator: the top-level entry point (§4.8).
//!
//! Ties together property-call decoding, the standard-interface
//! passthrough, the permission-management carve-out, policy authorization,
//! and peer manifest enforcement into the single call an embedding bus
//! attachment makes per message.

use std::sync::Arc;

use crate::acl::evaluate_acl;
use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::matcher::match_rule;
use crate::message::{decode_property_call, Direction, MsgDesc, PROPERTIES_INTERFACE};
use crate::peer::{PeerGuid, PeerState};
use crate::policy::{MsgKind, Policy, Rule};
use crate::qualify::qualify_peer;
use crate::rights::required_action;
use crate::trust::{PeerStateProvider, TrustAnchorStatus};

/// Fixed standard bus interfaces that are always allowed through,
/// regardless of policy (§4.8 step 2). These are the plumbing rails: bus
/// management, peer authentication/session setup, introspection.
pub const STANDARD_INTERFACES: &[&str] = &[
    "org.alljoyn.Bus",
    "org.alljoyn.Daemon",
    "org.alljoyn.Daemon.Debug",
    "org.alljoyn.Bus.Peer.Authentication",
    "org.alljoyn.Bus.Peer.Session",
    "org.alljoyn.Bus.Peer.HeaderCompression",
    "org.allseen.Introspectable",
    "org.freedesktop.DBus",
    "org.freedesktop.DBus.Peer",
    "org.freedesktop.DBus.Introspectable",
];

/// The claimable-application permission-management interface.
pub const CLAIMABLE_APPLICATION_INTERFACE: &str = "org.alljoyn.Bus.Security.ClaimableApplication";
/// The managed-application permission-management interface.
pub const MANAGED_APPLICATION_INTERFACE: &str = "org.alljoyn.Bus.Security.ManagedApplication";
/// The security-application permission-management interface.
pub const SECURITY_APPLICATION_INTERFACE: &str = "org.alljoyn.Bus.Security.Application";

fn is_standard_interface(interface_name: &str, extra: &[String]) -> bool {
    STANDARD_INTERFACES.contains(&interface_name) || extra.iter().any(|i| i == interface_name)
}

fn is_management_interface(interface_name: &str) -> bool {
    matches!(
        interface_name,
        CLAIMABLE_APPLICATION_INTERFACE
            | MANAGED_APPLICATION_INTERFACE
            | SECURITY_APPLICATION_INTERFACE
    )
}

const MANAGED_ALWAYS_ALLOW_MEMBERS: &[&str] =
    &["Identity", "Manifest", "IdentityCertificateId", "DefaultPolicy"];
const MANAGED_ADMIN_ONLY_MEMBERS: &[&str] =
    &["ReplaceIdentity", "Reset", "PolicyVersion", "Policy", "MembershipSummaries"];
const SECURITY_ALWAYS_ALLOW_MEMBERS: &[&str] = &[
    "ApplicationState",
    "ManifestTemplateDigest",
    "EccPublicKey",
    "ManufacturerCertificate",
    "ManifestTemplate",
    "ClaimCapabilities",
    "ClaimCapabilityAdditionalInfo",
];

/// Resolve the permission-management carve-out table (§4.8's table) for
/// one interface/member/direction. Member classification is exact-match,
/// not the original's prefix comparison — see the crate-level design
/// notes on why `IdentityCertificateId` no longer falls under `Identity`
/// by accident, and a hypothetical `ReplaceIdentityFoo` would no longer
/// slip past admin-gating.
///
/// Returns `None` when `interface_name` is not a management interface, or
/// is one but `member_name` has no row in the table — callers should fall
/// through to ordinary policy evaluation in that case.
fn management_verdict(
    interface_name: &str,
    member_name: &str,
    direction: Direction,
    claimed: bool,
    caller_is_admin: bool,
) -> Option<bool> {
    if !is_management_interface(interface_name) {
        return None;
    }
    if direction == Direction::Outgoing {
        return Some(true);
    }
    if member_name == "Version" {
        return Some(true);
    }
    match interface_name {
        CLAIMABLE_APPLICATION_INTERFACE if member_name == "Claim" => Some(!claimed),
        MANAGED_APPLICATION_INTERFACE if MANAGED_ALWAYS_ALLOW_MEMBERS.contains(&member_name) => {
            Some(true)
        }
        MANAGED_APPLICATION_INTERFACE if MANAGED_ADMIN_ONLY_MEMBERS.contains(&member_name) => {
            Some(caller_is_admin)
        }
        SECURITY_APPLICATION_INTERFACE if SECURITY_ALWAYS_ALLOW_MEMBERS.contains(&member_name) => {
            Some(true)
        }
        _ => None,
    }
}

/// Returns `true` when the peer holds a membership certificate in
/// `admin_group_id`.
fn caller_is_admin(peer: &PeerState, admin_group_id: Option<&str>) -> bool {
    admin_group_id.is_some_and(|group| peer.has_membership_in_group(group))
}

/// Whether a certificate-authenticated peer's manifest must also grant the
/// right (§4.7's enforcement matrix). Non-certificate mechanisms
/// (ECDHE-PSK, SRP, logon) have no manifest to check against.
fn enforce_manifest(peer: &PeerState) -> bool {
    peer.trusted_auth_complete && peer.public_key.is_some()
}

fn evaluate_manifest(rules: &[Rule], desc: &MsgDesc, required: crate::policy::ActionMask) -> bool {
    for rule in rules {
        let outcome = match_rule(rule, desc, required, false);
        if outcome.denied {
            return false;
        }
        if outcome.matched {
            return true;
        }
    }
    false
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Incoming => "incoming",
        Direction::Outgoing => "outgoing",
    }
}

fn denied_for_desc(reason: &str, desc: &MsgDesc) -> Error {
    Error::denied_for(
        reason,
        direction_label(desc.direction),
        desc.interface_name.clone(),
        desc.member_name.clone(),
    )
}

/// Run the full policy-authorization pass (§4.6) over every ACL in
/// `policy` that qualifies `peer`.
fn authorize_by_policy(policy: &Policy, peer: &PeerState, desc: &MsgDesc, required: crate::policy::ActionMask) -> Result<()> {
    let mut allowed = false;
    for acl in &policy.acls {
        let qualification = qualify_peer(acl, peer);
        if !qualification.qualifies {
            continue;
        }
        let outcome = evaluate_acl(acl, desc, required, qualification.via_public_key);
        if outcome.denied {
            tracing::debug!(interface = %desc.interface_name, member = %desc.member_name, "explicit deny in policy");
            return Err(denied_for_desc("explicit deny in policy", desc));
        }
        allowed |= outcome.allowed;
    }
    if allowed {
        Ok(())
    } else {
        Err(denied_for_desc("no policy ACL granted the required action", desc))
    }
}

/// A message as handed to the orchestrator, before Properties-interface
/// decoding. `kind` reflects the wire dispatch type — `Property` never
/// appears here, since property access arrives as an ordinary method call
/// targeting [`PROPERTIES_INTERFACE`] and is reclassified during decoding.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub direction: Direction,
    pub kind: MsgKind,
    pub obj_path: String,
    pub interface_name: String,
    pub member_name: String,
    /// Decoded string arguments, only consulted for Properties sub-calls.
    pub args: Vec<String>,
}

/// Decide whether `message` is authorized, given the current `policy`,
/// node claim status, and configuration. The caller's state is resolved
/// from `peers` by `peer_guid` — an unknown guid (not yet connected, or
/// already torn down) is treated as a freshly observed, unauthenticated
/// peer rather than an error, matching how a never-qualified peer matcher
/// already handles that peer (§6: "queried per evaluation, keyed by peer
/// guid").
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] when the message is blocked, and
/// [`Error::InvalidData`] when a Properties sub-call fails to decode.
pub fn authorize(
    message: &IncomingMessage,
    policy: &Policy,
    peers: &dyn PeerStateProvider,
    peer_guid: PeerGuid,
    trust: &dyn TrustAnchorStatus,
    config: &OrchestratorConfig,
) -> Result<()> {
    if message.kind != MsgKind::MethodCall && message.kind != MsgKind::Signal {
        return Ok(());
    }

    if is_standard_interface(&message.interface_name, &config.extra_standard_interfaces) {
        return Ok(());
    }

    let resolved = peers
        .peer_state(peer_guid)
        .unwrap_or_else(|| Arc::new(PeerState::unauthenticated()));
    let peer = resolved.as_ref();

    let mut desc = MsgDesc::new(
        message.direction,
        message.kind,
        message.obj_path.clone(),
        message.interface_name.clone(),
        message.member_name.clone(),
    );
    if desc.interface_name == PROPERTIES_INTERFACE {
        decode_property_call(&mut desc, &message.args)?;
        desc.kind = MsgKind::Property;
    }

    let claimed = trust.is_claimed();
    let admin_group_id = trust.admin_group_id();
    let is_admin = caller_is_admin(peer, admin_group_id.as_deref().or(config.admin_group_id.as_deref()));

    if let Some(verdict) = management_verdict(
        &desc.interface_name,
        &desc.member_name,
        desc.direction,
        claimed,
        is_admin,
    ) {
        return if verdict {
            Ok(())
        } else {
            Err(denied_for_desc(
                "permission-management carve-out rejected the call",
                &desc,
            ))
        };
    }

    if !claimed {
        return Ok(());
    }

    let Some(required) = required_action(&desc) else {
        tracing::debug!(member = %desc.member_name, "no action required, allowing");
        return Ok(());
    };

    authorize_by_policy(policy, peer, &desc, required)?;

    if enforce_manifest(peer) && !evaluate_manifest(&peer.manifest, &desc, required) {
        return Err(denied_for_desc(
            "peer manifest does not grant the required action",
            &desc,
        ));
    }

    Ok(())
}
