//! Error types for the authorization core.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the authorization core.
///
/// `PermissionDenied` is the ordinary "no" outcome and is not exceptional —
/// callers should expect to see it often. The other variants indicate a
/// malformed input from a trusted source (the local policy store or the
/// peer wire) and should be surfaced to the caller rather than swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The message was blocked by policy, peer qualification, or manifest
    /// enforcement.
    ///
    /// Carries the message's direction/interface/member for caller-side
    /// logging. Callers must match on the variant, not parse `Display`.
    #[error("permission denied: {reason}")]
    PermissionDenied {
        /// Short, structured reason (e.g. "explicit deny in policy").
        reason: String,
        /// `"incoming"`/`"outgoing"`, when known.
        direction: Option<String>,
        /// The interface the message targeted, when known.
        interface: Option<String>,
        /// The member name the message targeted, when known.
        member: Option<String>,
    },

    /// A Properties sub-call failed argument decoding or named an unknown
    /// member.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The policy wire format's `specVersion` was not the one this core
    /// understands.
    #[error("policy version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The `specVersion` this core supports.
        expected: u32,
        /// The `specVersion` found on the wire.
        actual: u32,
    },

    /// The policy wire tree could not be imported into the in-memory model.
    #[error("unsupported policy shape: {0}")]
    UnsupportedPolicyShape(String),
}

impl Error {
    /// Build a [`Error::PermissionDenied`] with a short reason and no
    /// message context.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
            direction: None,
            interface: None,
            member: None,
        }
    }

    /// Build a [`Error::PermissionDenied`] carrying the message context it
    /// was raised for.
    pub fn denied_for(
        reason: impl Into<String>,
        direction: impl Into<String>,
        interface: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
            direction: Some(direction.into()),
            interface: Some(interface.into()),
            member: Some(member.into()),
        }
    }

    /// Build an [`Error::InvalidData`] with context.
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData(reason.into())
    }

    /// Build an [`Error::UnsupportedPolicyShape`] with context.
    pub fn unsupported_shape(reason: impl Into<String>) -> Self {
        Self::UnsupportedPolicyShape(reason.into())
    }
}
