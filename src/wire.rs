//! The externally-serialized policy wire format (§6).
//!
//! The core never produces a `Policy` by parsing bytes itself in normal
//! operation — a host application decodes a signed/transported blob into
//! [`PolicyWire`] (via `serde_json`, or any other `serde` format) and then
//! converts it with [`TryFrom`]. Keeping the wire shape as a separate type
//! from [`Policy`] means a malformed document is rejected before it ever
//! reaches the evaluator.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::policy::{Acl, ActionMask, EccKey, Member, MsgKind, Peer, Policy, Rule, RuleType, SecurityLevel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyWire {
    pub spec_version: u32,
    pub version: u32,
    pub acls: Vec<AclWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclWire {
    pub peers: Vec<PeerWire>,
    pub rules: Vec<RuleWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PeerWire {
    All,
    AnyTrusted,
    WithPublicKey { key: String },
    FromCertificateAuthority { key: String },
    WithMembership { group_id: String, key: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleWire {
    #[serde(default = "default_obj_path")]
    pub obj_path: String,
    #[serde(default)]
    pub interface_name: String,
    #[serde(default)]
    pub is_manifest_template: bool,
    #[serde(default = "default_security_level")]
    pub recommended_security_level: SecurityLevelWire,
    pub members: Vec<MemberWire>,
}

fn default_obj_path() -> String {
    Rule::DEFAULT_OBJ_PATH.to_string()
}

fn default_security_level() -> SecurityLevelWire {
    SecurityLevelWire::Privileged
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SecurityLevelWire {
    Privileged,
    NonPrivileged,
    Unauthenticated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberWire {
    #[serde(default)]
    pub name: String,
    pub kind: Option<MsgKindWire>,
    pub action_mask: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MsgKindWire {
    MethodCall,
    Signal,
    Property,
    Other,
}

fn key_from_hex(hex: &str) -> Result<EccKey> {
    let bytes = hex_decode(hex)?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| Error::unsupported_shape("public key must be 32 bytes"))?;
    Ok(EccKey::new(array))
}

fn key_to_hex(key: EccKey) -> String {
    hex_encode(&key.0)
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(Error::unsupported_shape("hex key has odd length"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| Error::unsupported_shape("invalid hex digit in key"))
        })
        .collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl TryFrom<PeerWire> for Peer {
    type Error = Error;

    fn try_from(wire: PeerWire) -> Result<Self> {
        Ok(match wire {
            PeerWire::All => Peer::All,
            PeerWire::AnyTrusted => Peer::AnyTrusted,
            PeerWire::WithPublicKey { key } => Peer::WithPublicKey(key_from_hex(&key)?),
            PeerWire::FromCertificateAuthority { key } => {
                Peer::FromCertificateAuthority(key_from_hex(&key)?)
            }
            PeerWire::WithMembership { group_id, key } => Peer::WithMembership {
                group_id,
                key: key_from_hex(&key)?,
            },
        })
    }
}

impl From<&Peer> for PeerWire {
    fn from(peer: &Peer) -> Self {
        match peer {
            Peer::All => PeerWire::All,
            Peer::AnyTrusted => PeerWire::AnyTrusted,
            Peer::WithPublicKey(key) => PeerWire::WithPublicKey {
                key: key_to_hex(*key),
            },
            Peer::FromCertificateAuthority(key) => PeerWire::FromCertificateAuthority {
                key: key_to_hex(*key),
            },
            Peer::WithMembership { group_id, key } => PeerWire::WithMembership {
                group_id: group_id.clone(),
                key: key_to_hex(*key),
            },
        }
    }
}

impl From<SecurityLevelWire> for SecurityLevel {
    fn from(wire: SecurityLevelWire) -> Self {
        match wire {
            SecurityLevelWire::Privileged => SecurityLevel::Privileged,
            SecurityLevelWire::NonPrivileged => SecurityLevel::NonPrivileged,
            SecurityLevelWire::Unauthenticated => SecurityLevel::Unauthenticated,
        }
    }
}

impl From<SecurityLevel> for SecurityLevelWire {
    fn from(level: SecurityLevel) -> Self {
        match level {
            SecurityLevel::Privileged => SecurityLevelWire::Privileged,
            SecurityLevel::NonPrivileged => SecurityLevelWire::NonPrivileged,
            SecurityLevel::Unauthenticated => SecurityLevelWire::Unauthenticated,
        }
    }
}

impl From<MsgKindWire> for MsgKind {
    fn from(wire: MsgKindWire) -> Self {
        match wire {
            MsgKindWire::MethodCall => MsgKind::MethodCall,
            MsgKindWire::Signal => MsgKind::Signal,
            MsgKindWire::Property => MsgKind::Property,
            MsgKindWire::Other => MsgKind::Other,
        }
    }
}

impl From<MsgKind> for MsgKindWire {
    fn from(kind: MsgKind) -> Self {
        match kind {
            MsgKind::MethodCall => MsgKindWire::MethodCall,
            MsgKind::Signal => MsgKindWire::Signal,
            MsgKind::Property => MsgKindWire::Property,
            MsgKind::Other => MsgKindWire::Other,
        }
    }
}

impl TryFrom<MemberWire> for Member {
    type Error = Error;

    fn try_from(wire: MemberWire) -> Result<Self> {
        Ok(Member {
            name: wire.name,
            kind: wire.kind.map(MsgKind::from),
            action_mask: ActionMask::from_bits(wire.action_mask)
                .ok_or_else(|| Error::unsupported_shape("action_mask has unknown bits set"))?,
        })
    }
}

impl From<&Member> for MemberWire {
    fn from(member: &Member) -> Self {
        MemberWire {
            name: member.name.clone(),
            kind: member.kind.map(MsgKindWire::from),
            action_mask: member.action_mask.bits(),
        }
    }
}

impl TryFrom<RuleWire> for Rule {
    type Error = Error;

    fn try_from(wire: RuleWire) -> Result<Self> {
        let members = wire
            .members
            .into_iter()
            .map(Member::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Rule {
            obj_path: wire.obj_path,
            interface_name: wire.interface_name,
            rule_type: if wire.is_manifest_template {
                RuleType::ManifestTemplate
            } else {
                RuleType::ManifestOrPolicy
            },
            recommended_security_level: wire.recommended_security_level.into(),
            members,
        })
    }
}

impl From<&Rule> for RuleWire {
    fn from(rule: &Rule) -> Self {
        RuleWire {
            obj_path: rule.obj_path.clone(),
            interface_name: rule.interface_name.clone(),
            is_manifest_template: rule.rule_type == RuleType::ManifestTemplate,
            recommended_security_level: rule.recommended_security_level.into(),
            members: rule.members.iter().map(MemberWire::from).collect(),
        }
    }
}

impl TryFrom<AclWire> for Acl {
    type Error = Error;

    fn try_from(wire: AclWire) -> Result<Self> {
        let peers = wire
            .peers
            .into_iter()
            .map(Peer::try_from)
            .collect::<Result<Vec<_>>>()?;
        let rules = wire
            .rules
            .into_iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Acl { peers, rules })
    }
}

impl From<&Acl> for AclWire {
    fn from(acl: &Acl) -> Self {
        AclWire {
            peers: acl.peers.iter().map(PeerWire::from).collect(),
            rules: acl.rules.iter().map(RuleWire::from).collect(),
        }
    }
}

impl TryFrom<PolicyWire> for Policy {
    type Error = Error;

    /// Convert an imported document into an in-process [`Policy`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionMismatch`] when `spec_version` does not
    /// equal [`Policy::SPEC_VERSION`], and [`Error::UnsupportedPolicyShape`]
    /// (via the underlying member/peer conversions) when the document
    /// contains a shape this core cannot represent — an unknown action
    /// mask bit or a malformed key.
    fn try_from(wire: PolicyWire) -> Result<Self> {
        if wire.spec_version != Policy::SPEC_VERSION {
            return Err(Error::VersionMismatch {
                expected: Policy::SPEC_VERSION,
                actual: wire.spec_version,
            });
        }
        let acls = wire
            .acls
            .into_iter()
            .map(Acl::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Policy {
            spec_version: wire.spec_version,
            version: wire.version,
            acls,
        })
    }
}

impl From<&Policy> for PolicyWire {
    fn from(policy: &Policy) -> Self {
        PolicyWire {
            spec_version: policy.spec_version,
            version: policy.version,
            acls: policy.acls.iter().map(AclWire::from).collect(),
        }
    }
}

/// Parse a JSON document directly into a [`Policy`] (convenience wrapper
/// around [`PolicyWire`] and the `TryFrom` conversion).
pub fn policy_from_json(json: &str) -> Result<Policy> {
    let wire: PolicyWire =
        serde_json::from_str(json).map_err(|e| Error::invalid_data(e.to_string()))?;
    Policy::try_from(wire)
}

/// Serialize a [`Policy`] to its JSON wire form.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] if serialization fails, which should
/// only happen for programmer error (e.g. a `NaN` float — not reachable
/// through this module's types).
pub fn policy_to_json(policy: &Policy) -> Result<String> {
    let wire = PolicyWire::from(policy);
    serde_json::to_string(&wire).map_err(|e| Error::invalid_data(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;
    use pretty_assertions::assert_eq;

    fn sample_policy() -> Policy {
        Policy {
            spec_version: Policy::SPEC_VERSION,
            version: 3,
            acls: vec![Acl {
                peers: vec![
                    Peer::All,
                    Peer::WithPublicKey(EccKey::new([0xab; 32])),
                    Peer::WithMembership {
                        group_id: "admins".to_string(),
                        key: EccKey::new([0xcd; 32]),
                    },
                ],
                rules: vec![Rule {
                    obj_path: "*".to_string(),
                    interface_name: "*".to_string(),
                    rule_type: RuleType::ManifestOrPolicy,
                    recommended_security_level: SecurityLevel::Privileged,
                    members: vec![Member {
                        name: "*".to_string(),
                        kind: None,
                        action_mask: ActionMask::MODIFY,
                    }],
                }],
            }],
        }
    }

    #[test]
    fn policy_round_trips_through_json() {
        let policy = sample_policy();
        let json = policy_to_json(&policy).unwrap();
        let parsed = policy_from_json(&json).unwrap();
        assert_eq!(policy, parsed);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut wire = PolicyWire::from(&sample_policy());
        wire.spec_version = 99;
        let err = Policy::try_from(wire).unwrap_err();
        assert!(matches!(
            err,
            Error::VersionMismatch {
                expected: 1,
                actual: 99
            }
        ));
    }

    #[test]
    fn unknown_action_mask_bits_are_rejected() {
        let mut wire = PolicyWire::from(&sample_policy());
        wire.acls[0].rules[0].members[0].action_mask = 0xff;
        let err = Policy::try_from(wire).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPolicyShape(_)));
    }

    #[test]
    fn malformed_hex_key_is_unsupported_shape() {
        let mut wire = PolicyWire::from(&sample_policy());
        wire.acls[0].peers[1] = PeerWire::WithPublicKey {
            key: "not-hex".to_string(),
        };
        let err = Policy::try_from(wire).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPolicyShape(_)));
    }
}
