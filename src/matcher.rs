//! The rule matcher: decides whether a [`Rule`] matches a [`MsgDesc`] for a
//! required action, and whether it contributes an explicit deny (§4.3).

use crate::message::MsgDesc;
use crate::policy::{is_action_allowed, ActionMask, Rule};

/// Outcome of matching a single rule against a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Whether the rule matched and granted the required action.
    pub matched: bool,
    /// Whether the rule contributed an explicit deny. When `true`, callers
    /// must short-circuit the remainder of the ACL (§4.4).
    pub denied: bool,
}

impl MatchOutcome {
    const NO_MATCH: Self = Self {
        matched: false,
        denied: false,
    };

    const fn matched() -> Self {
        Self {
            matched: true,
            denied: false,
        }
    }

    const fn denied() -> Self {
        Self {
            matched: false,
            denied: true,
        }
    }
}

/// A compiled glob pattern over `*`, supporting an arbitrary number of
/// wildcard tokens (§4.3's "canonical semantics"): split the pattern on
/// `*`, require the literal segments to occur in `subject` in order, with
/// the first segment anchored at the start and the last at the end.
///
/// This is a pure, allocation-free function over borrowed strings — it is
/// called on the hot path (§5, §9).
#[must_use]
pub fn wildcard_match(pattern: &str, subject: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == subject;
    }

    let mut segments = pattern.split('*');
    // `split` on a pattern containing at least one '*' always yields >= 2 items.
    let first = segments.next().unwrap_or("");
    let mut rest: Vec<&str> = segments.collect();
    let last = rest.pop().unwrap_or("");

    let mut cursor = subject;
    if !cursor.starts_with(first) {
        return false;
    }
    cursor = &cursor[first.len()..];

    for segment in &rest {
        if segment.is_empty() {
            continue;
        }
        match cursor.find(segment) {
            Some(idx) => cursor = &cursor[idx + segment.len()..],
            None => return false,
        }
    }

    cursor.ends_with(last) && cursor.len() >= last.len()
}

/// Returns `true` when `filter` (an object path or interface name taken
/// from a rule) matches `value` (the same field on the message): either an
/// exact match, or `filter` prefix/glob-matches `value`. An empty `filter`
/// means "do not filter on this dimension" and is handled by the caller.
fn filter_matches(filter: &str, value: &str) -> bool {
    filter == value || wildcard_match(filter, value)
}

/// Match `rule` against `desc` for `required`. `scan_for_denied` enables
/// explicit-deny detection (§4.3) — set it to the ACL-qualification's
/// `via_public_key` result (§4.6).
#[must_use]
pub fn match_rule(
    rule: &Rule,
    desc: &MsgDesc,
    required: ActionMask,
    scan_for_denied: bool,
) -> MatchOutcome {
    if rule.members.is_empty() {
        return MatchOutcome::NO_MATCH;
    }

    if !rule.obj_path.is_empty() && !filter_matches(&rule.obj_path, &desc.obj_path) {
        return MatchOutcome::NO_MATCH;
    }
    if !rule.interface_name.is_empty() && !filter_matches(&rule.interface_name, &desc.interface_name)
    {
        return MatchOutcome::NO_MATCH;
    }

    let scan_for_denied = scan_for_denied && rule.is_deny_candidate_shape();

    if desc.member_name.is_empty() {
        // GetAll: every surviving member (by kind) must allow the action.
        let mut allowed = true;
        for member in &rule.members {
            if let Some(kind) = member.kind {
                if kind != desc.kind {
                    continue;
                }
            }
            if !is_action_allowed(member.action_mask, required) {
                allowed = false;
                break;
            }
        }
        return if allowed {
            MatchOutcome::matched()
        } else {
            MatchOutcome::NO_MATCH
        };
    }

    let mut allowed = false;
    for member in &rule.members {
        if !member.name.is_empty() && !filter_matches(&member.name, &desc.member_name) {
            continue;
        }
        if let Some(kind) = member.kind {
            if kind != desc.kind {
                continue;
            }
        }

        if scan_for_denied && member.name == "*" && member.action_mask.is_empty() {
            return MatchOutcome::denied();
        }
        if !allowed {
            allowed = is_action_allowed(member.action_mask, required);
        }
    }
    if allowed {
        MatchOutcome::matched()
    } else {
        MatchOutcome::NO_MATCH
    }
}
