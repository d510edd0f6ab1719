//! The normalized message descriptor the core evaluates.
//!
//! [`MsgDesc`] is created fresh per message and never persisted; it is the
//! only representation of "the message" the authorization core sees — the
//! wire protocol and session layer are responsible for producing it.

use crate::policy::MsgKind;

/// Which way a message is travelling relative to the local bus attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Locally originated, headed to the remote peer.
    Outgoing,
    /// Received from the remote peer.
    Incoming,
}

impl Direction {
    /// The opposite direction.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
        }
    }
}

/// The normalized view of a message under evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgDesc {
    /// Direction relative to the local attachment.
    pub direction: Direction,
    /// Member kind (method call / signal / property / other).
    pub kind: MsgKind,
    /// Object path the message targets.
    pub obj_path: String,
    /// Interface name. For Properties sub-calls this is rewritten to the
    /// target interface by [`crate::message::decode_property_call`].
    pub interface_name: String,
    /// Member name; empty for a `GetAll` request (matches all properties).
    pub member_name: String,
    /// `true` when this originated as a Properties interface call.
    pub property_request: bool,
    /// `true` when the decoded Properties sub-call was `Set` (vs `Get`/`GetAll`).
    pub is_set_property: bool,
}

impl MsgDesc {
    /// Build a descriptor for a non-Properties message: the interface and
    /// member are taken as-is from the wire message.
    #[must_use]
    pub fn new(
        direction: Direction,
        kind: MsgKind,
        obj_path: impl Into<String>,
        interface_name: impl Into<String>,
        member_name: impl Into<String>,
    ) -> Self {
        Self {
            direction,
            kind,
            obj_path: obj_path.into(),
            interface_name: interface_name.into(),
            member_name: member_name.into(),
            property_request: false,
            is_set_property: false,
        }
    }
}

/// The standard freedesktop.org Properties interface name.
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Decode a Properties sub-call (`Get`, `Set`, `GetAll`) from its raw
/// string arguments and rewrite `desc` in place to target the decoded
/// interface/property (§4.2).
///
/// `args` holds the message's string arguments in wire order: for `Get`
/// and `Set` this is `[target_interface, target_property, ...]`; for
/// `GetAll` it is `[target_interface, ...]`.
///
/// Member-name classification is by exact match, not prefix (`spec.md`
/// §9's REDESIGN FLAG): a member named `"Getter"` is rejected as unknown
/// rather than silently routed through the `Get` path.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidData`] when the member name is not one
/// of `Get`/`Set`/`GetAll`, or when `args` holds fewer strings than the
/// sub-call requires.
pub fn decode_property_call(desc: &mut MsgDesc, args: &[String]) -> crate::Result<()> {
    let sub_call = desc.member_name.clone();
    match sub_call.as_str() {
        "GetAll" => {
            let target_interface = args
                .first()
                .ok_or_else(|| crate::Error::invalid_data("GetAll requires 1 string argument"))?;
            desc.interface_name = target_interface.clone();
            desc.member_name = String::new();
            desc.property_request = true;
            desc.is_set_property = false;
        }
        "Get" | "Set" => {
            if args.len() < 2 {
                return Err(crate::Error::invalid_data(
                    "Get/Set requires 2 string arguments",
                ));
            }
            desc.interface_name = args[0].clone();
            desc.member_name = args[1].clone();
            desc.property_request = true;
            desc.is_set_property = sub_call == "Set";
        }
        other => {
            return Err(crate::Error::invalid_data(format!(
                "unknown Properties sub-call: {other}"
            )));
        }
    }
    Ok(())
}
