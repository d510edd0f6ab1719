//! The ACL evaluator: walks the rules of one [`Acl`], combining matches
//! with deny short-circuit (§4.4).

use crate::matcher::match_rule;
use crate::message::MsgDesc;
use crate::policy::{Acl, ActionMask};

/// Outcome of evaluating one ACL against a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclOutcome {
    /// Whether any rule in the ACL matched and granted the action.
    pub allowed: bool,
    /// Whether a rule contributed an explicit deny. Callers must
    /// short-circuit the remaining ACLs of the policy when this is `true`
    /// (§4.6).
    pub denied: bool,
}

/// Evaluate every rule of `acl` against `desc` for `required`, in
/// declaration order. A deny short-circuits the remaining rules of this
/// ACL; otherwise matches are OR-ed together.
#[must_use]
pub fn evaluate_acl(acl: &Acl, desc: &MsgDesc, required: ActionMask, scan_for_denied: bool) -> AclOutcome {
    let mut any_allow = false;
    for rule in &acl.rules {
        let outcome = match_rule(rule, desc, required, scan_for_denied);
        if outcome.denied {
            return AclOutcome {
                allowed: any_allow,
                denied: true,
            };
        }
        any_allow |= outcome.matched;
    }
    AclOutcome {
        allowed: any_allow,
        denied: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Direction, MsgDesc};
    use crate::policy::{Member, MsgKind, Rule, RuleType, SecurityLevel};

    fn rule(obj_path: &str, iface: &str, name: &str, mask: ActionMask) -> Rule {
        Rule {
            obj_path: obj_path.to_string(),
            interface_name: iface.to_string(),
            rule_type: RuleType::ManifestOrPolicy,
            recommended_security_level: SecurityLevel::Privileged,
            members: vec![Member {
                name: name.to_string(),
                kind: None,
                action_mask: mask,
            }],
        }
    }

    fn method_call() -> MsgDesc {
        MsgDesc::new(Direction::Incoming, MsgKind::MethodCall, "/foo", "com.x.Y", "m")
    }

    #[test]
    fn allow_then_deny_short_circuits_to_denied() {
        let acl = Acl {
            peers: vec![],
            rules: vec![
                rule("*", "*", "*", ActionMask::MODIFY),
                rule("*", "*", "*", ActionMask::empty()),
            ],
        };
        let outcome = evaluate_acl(&acl, &method_call(), ActionMask::MODIFY, true);
        assert!(outcome.denied);
        // allowed still reflects what had been seen before the deny fired.
        assert!(outcome.allowed);
    }

    #[test]
    fn matches_are_ored_across_rules() {
        let acl = Acl {
            peers: vec![],
            rules: vec![
                rule("/other", "*", "*", ActionMask::MODIFY),
                rule("/foo", "com.x.Y", "m", ActionMask::MODIFY),
            ],
        };
        let outcome = evaluate_acl(&acl, &method_call(), ActionMask::MODIFY, false);
        assert!(outcome.allowed);
        assert!(!outcome.denied);
    }

    #[test]
    fn no_rule_matches_denies_by_omission() {
        let acl = Acl {
            peers: vec![],
            rules: vec![rule("/other", "*", "*", ActionMask::MODIFY)],
        };
        let outcome = evaluate_acl(&acl, &method_call(), ActionMask::MODIFY, false);
        assert!(!outcome.allowed);
        assert!(!outcome.denied);
    }

    #[test]
    fn deny_after_no_allow_still_reports_denied_with_allowed_false() {
        let acl = Acl {
            peers: vec![],
            rules: vec![
                rule("/other", "*", "*", ActionMask::MODIFY),
                rule("*", "*", "*", ActionMask::empty()),
            ],
        };
        let outcome = evaluate_acl(&acl, &method_call(), ActionMask::MODIFY, true);
        assert!(outcome.denied);
        assert!(!outcome.allowed);
    }
}
