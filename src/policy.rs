//! The permission policy tree: `Policy -> Acl -> (Peer, Rule) -> Member`.
//!
//! Every type here is an immutable value. Construction happens once, either
//! by hand (tests, embedders building a policy programmatically) or via
//! [`crate::wire`] when importing an externally-serialized tree. Nothing in
//! this module performs I/O.

use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::RwLock;

bitflags! {
    /// The set of actions a [`Member`] grants against a message.
    ///
    /// `OBSERVE` is subsumed by `MODIFY` (see [`is_action_allowed`]);
    /// `PROVIDE` never subsumes the other two.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActionMask: u8 {
        /// Caller may consume the provided surface (outgoing calls, incoming signals).
        const PROVIDE = 0x01;
        /// Caller may observe (read) the target.
        const OBSERVE = 0x02;
        /// Caller may modify (write) the target.
        const MODIFY = 0x04;
    }
}

/// Required action derived for a message; see [`crate::rights`].
pub type RequiredAction = ActionMask;

/// Returns `true` when `mask` grants `required`, accounting for the single
/// subsumption rule: `MODIFY` also grants `OBSERVE`. `PROVIDE` grants
/// nothing but itself.
#[must_use]
pub fn is_action_allowed(mask: ActionMask, required: ActionMask) -> bool {
    if mask.contains(required) {
        return true;
    }
    required == ActionMask::OBSERVE && mask.contains(ActionMask::MODIFY)
}

/// An opaque elliptic-curve public key.
///
/// The core never inspects key material — it only compares keys for
/// equality and chain membership. The byte representation and curve are
/// the authentication subsystem's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EccKey(pub [u8; 32]);

impl EccKey {
    /// Build a key from a 32-byte value.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A matcher describing which remote peers an [`Acl`] applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    /// Matches any caller, trusted or not.
    All,
    /// Matches any caller that completed a trusted authentication.
    AnyTrusted,
    /// Matches exactly the peer holding this public key.
    WithPublicKey(EccKey),
    /// Matches peers whose issuer chain contains this key.
    FromCertificateAuthority(EccKey),
    /// Matches peers holding a membership certificate issued to `group_id`.
    WithMembership {
        /// The security group identifier.
        group_id: String,
        /// The group's root key (informational — matching is by group id).
        key: EccKey,
    },
}

/// The kind of bus member a message or a [`Member`] entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgKind {
    /// A method call.
    MethodCall,
    /// A signal.
    Signal,
    /// A property get/set/getall.
    Property,
    /// Anything else (error replies, etc.) — never matched by a [`Member`]
    /// with a specified kind.
    Other,
}

/// One named (or wildcard) member entry inside a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Member name, or `"*"`/empty for "any".
    pub name: String,
    /// Kind filter. `None` means "do not filter on kind" (§3.1: `NotSpecified`).
    pub kind: Option<MsgKind>,
    /// Actions this member grants.
    pub action_mask: ActionMask,
}

/// The purpose a [`Rule`] was authored for — affects equality (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    /// An ordinary policy or manifest rule.
    ManifestOrPolicy,
    /// A manifest template rule (carries a recommended security level that
    /// participates in equality).
    ManifestTemplate,
}

/// The recommended security level carried by manifest template rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    /// Requires a trusted, authenticated peer.
    Privileged,
    /// Does not require authentication to be trusted but is still policed.
    NonPrivileged,
    /// No authentication required at all.
    Unauthenticated,
}

/// A rule: a scoped set of member grants.
///
/// Equality ignores `recommended_security_level` unless `rule_type ==
/// ManifestTemplate` — see the manual [`PartialEq`] impl below.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Object path filter; empty means "do not filter on this dimension".
    pub obj_path: String,
    /// Interface name filter; empty means "do not filter on this dimension".
    pub interface_name: String,
    /// Whether this is a policy rule or a manifest template rule.
    pub rule_type: RuleType,
    /// Recommended security level (only semantically meaningful, and only
    /// compared, for `ManifestTemplate` rules).
    pub recommended_security_level: SecurityLevel,
    /// The member grants.
    pub members: Vec<Member>,
}

impl Rule {
    /// Default object path: "do not filter".
    pub const DEFAULT_OBJ_PATH: &'static str = "*";

    /// Returns `true` when this rule's shape qualifies it as an explicit
    /// deny candidate: `obj_path == "*"` and `interface_name == "*"`.
    #[must_use]
    pub fn is_deny_candidate_shape(&self) -> bool {
        self.obj_path == "*" && self.interface_name == "*"
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        let base_eq = self.obj_path == other.obj_path
            && self.interface_name == other.interface_name
            && self.rule_type == other.rule_type
            && self.members == other.members;
        if !base_eq {
            return false;
        }
        if self.rule_type == RuleType::ManifestTemplate {
            return self.recommended_security_level == other.recommended_security_level;
        }
        true
    }
}
impl Eq for Rule {}

/// One access-control list: a set of peer matchers paired with a set of
/// rules. All rules apply to every peer this ACL qualifies (§4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    /// Peer matchers. First match wins (§4.5).
    pub peers: Vec<Peer>,
    /// Rules evaluated against a qualified peer's messages (§4.4).
    pub rules: Vec<Rule>,
}

/// The locally held permission policy: an ordered sequence of ACLs.
///
/// `spec_version` must equal [`Policy::SPEC_VERSION`] on import (see
/// [`crate::wire`]); `version` is an application-defined monotonic counter
/// this core does not interpret beyond equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Policy wire format version. Always [`Policy::SPEC_VERSION`] for a
    /// value constructed in-process.
    pub spec_version: u32,
    /// Application-defined monotonic counter.
    pub version: u32,
    /// The ACLs, evaluated in order (§4.6).
    pub acls: Vec<Acl>,
}

impl Policy {
    /// The only `specVersion` this core understands.
    pub const SPEC_VERSION: u32 = 1;

    /// Build an empty policy at the current version.
    #[must_use]
    pub fn empty(version: u32) -> Self {
        Self {
            spec_version: Self::SPEC_VERSION,
            version,
            acls: Vec::new(),
        }
    }
}

/// The live, atomically-swappable policy shared across concurrent
/// evaluations (§5).
///
/// Readers take a read-lock and clone the inner `Arc` (a pointer-width
/// copy); writers swap the whole `Arc` under a write-lock. A reader that
/// already cloned the `Arc` observes a consistent snapshot even if
/// [`PolicySnapshot::publish`] runs concurrently — it never sees a
/// partially-replaced tree.
pub struct PolicySnapshot {
    inner: RwLock<Arc<Policy>>,
}

impl PolicySnapshot {
    /// Seed a snapshot with the startup policy.
    #[must_use]
    pub fn new(policy: Policy) -> Self {
        Self {
            inner: RwLock::new(Arc::new(policy)),
        }
    }

    /// Clone the currently active policy.
    #[must_use]
    pub fn current(&self) -> Arc<Policy> {
        Arc::clone(&self.inner.read())
    }

    /// Atomically replace the active policy with `policy`.
    pub fn publish(&self, policy: Policy) {
        *self.inner.write() = Arc::new(policy);
    }
}
