//! Right derivation: the pure function from [`MsgDesc`] to the action bit
//! required to permit it (§4.1).

use crate::message::{Direction, MsgDesc};
use crate::policy::{ActionMask, MsgKind};

/// Derive the action required to permit `desc`, or `None` when the message
/// carries no permission-relevant action (only reachable for `Other`-kind
/// descriptors, which the orchestrator never builds — see `spec.md` §4.8
/// step 1).
#[must_use]
pub fn required_action(desc: &MsgDesc) -> Option<ActionMask> {
    match (desc.kind, desc.property_request, desc.is_set_property, desc.direction) {
        (MsgKind::Property, true, true, Direction::Outgoing) => Some(ActionMask::PROVIDE),
        (MsgKind::Property, true, true, Direction::Incoming) => Some(ActionMask::MODIFY),
        (MsgKind::Property, true, false, Direction::Outgoing) => Some(ActionMask::PROVIDE),
        (MsgKind::Property, true, false, Direction::Incoming) => Some(ActionMask::OBSERVE),
        (MsgKind::MethodCall, _, _, Direction::Outgoing) => Some(ActionMask::PROVIDE),
        (MsgKind::MethodCall, _, _, Direction::Incoming) => Some(ActionMask::MODIFY),
        (MsgKind::Signal, _, _, Direction::Outgoing) => Some(ActionMask::OBSERVE),
        (MsgKind::Signal, _, _, Direction::Incoming) => Some(ActionMask::PROVIDE),
        (MsgKind::Other, ..) => None,
        // A Property-kind descriptor that hasn't been through
        // decode_property_call yet has no decided action.
        (MsgKind::Property, false, ..) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(kind: MsgKind, direction: Direction, property_request: bool, is_set: bool) -> MsgDesc {
        let mut d = MsgDesc::new(direction, kind, "/p", "com.example.I", "M");
        d.property_request = property_request;
        d.is_set_property = is_set;
        d
    }

    #[test]
    fn method_call_outgoing_is_provide() {
        assert_eq!(
            required_action(&desc(MsgKind::MethodCall, Direction::Outgoing, false, false)),
            Some(ActionMask::PROVIDE)
        );
    }

    #[test]
    fn method_call_incoming_is_modify() {
        assert_eq!(
            required_action(&desc(MsgKind::MethodCall, Direction::Incoming, false, false)),
            Some(ActionMask::MODIFY)
        );
    }

    #[test]
    fn signal_outgoing_is_observe() {
        assert_eq!(
            required_action(&desc(MsgKind::Signal, Direction::Outgoing, false, false)),
            Some(ActionMask::OBSERVE)
        );
    }

    #[test]
    fn signal_incoming_is_provide() {
        assert_eq!(
            required_action(&desc(MsgKind::Signal, Direction::Incoming, false, false)),
            Some(ActionMask::PROVIDE)
        );
    }

    #[test]
    fn property_get_outgoing_is_provide() {
        assert_eq!(
            required_action(&desc(MsgKind::Property, Direction::Outgoing, true, false)),
            Some(ActionMask::PROVIDE)
        );
    }

    #[test]
    fn property_get_incoming_is_observe() {
        assert_eq!(
            required_action(&desc(MsgKind::Property, Direction::Incoming, true, false)),
            Some(ActionMask::OBSERVE)
        );
    }

    #[test]
    fn property_set_outgoing_is_provide() {
        assert_eq!(
            required_action(&desc(MsgKind::Property, Direction::Outgoing, true, true)),
            Some(ActionMask::PROVIDE)
        );
    }

    #[test]
    fn property_set_incoming_is_modify() {
        assert_eq!(
            required_action(&desc(MsgKind::Property, Direction::Incoming, true, true)),
            Some(ActionMask::MODIFY)
        );
    }

    #[test]
    fn other_kind_has_no_required_action() {
        assert_eq!(
            required_action(&desc(MsgKind::Other, Direction::Incoming, false, false)),
            None
        );
    }

    // ── direction symmetry (§8.2) ─────────────────────────────────────────

    #[test]
    fn method_call_direction_symmetry_swaps_provide_modify() {
        let out = required_action(&desc(MsgKind::MethodCall, Direction::Outgoing, false, false));
        let inc = required_action(&desc(MsgKind::MethodCall, Direction::Incoming, false, false));
        assert_eq!(out, Some(ActionMask::PROVIDE));
        assert_eq!(inc, Some(ActionMask::MODIFY));
    }

    #[test]
    fn signal_direction_symmetry_swaps_provide_observe() {
        let out = required_action(&desc(MsgKind::Signal, Direction::Outgoing, false, false));
        let inc = required_action(&desc(MsgKind::Signal, Direction::Incoming, false, false));
        assert_eq!(out, Some(ActionMask::OBSERVE));
        assert_eq!(inc, Some(ActionMask::PROVIDE));
    }
}
