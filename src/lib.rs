//! Message authorization core for an AllJoyn-style secure distributed
//! messaging framework.
//!
//! This crate decides, for every inbound and outbound method call, signal,
//! and property access, whether a remote peer is permitted to invoke the
//! operation against a local object. It consumes a locally held permission
//! policy, the authentication metadata of the connected peer, and the
//! peer's signed manifest, and emits a single accept/deny verdict per
//! message.
//!
//! # What this crate does not do
//!
//! It does not authenticate peers, does not parse certificates or manifest
//! XML, does not manage sessions, and does not log audit trails or enforce
//! rate limits — those are the embedding application's responsibility. See
//! [`trust`] for the narrow interfaces this crate expects from them.
//!
//! # Entry point
//!
//! [`orchestrator::authorize`] is the top-level call an embedding bus
//! attachment makes once per message.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod acl;
pub mod config;
pub mod error;
pub mod matcher;
pub mod message;
pub mod orchestrator;
pub mod peer;
pub mod policy;
pub mod qualify;
pub mod rights;
pub mod trust;
pub mod wire;

pub use error::{Error, Result};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Policy wire format version this build understands.
pub const SPEC_VERSION: u32 = policy::Policy::SPEC_VERSION;

/// Initialize structured logging for an embedding application.
///
/// `level` is used as the default filter when `RUST_LOG` is unset.
/// `format` of `Some("json")` selects JSON output; anything else uses the
/// default human-readable formatter.
///
/// # Errors
///
/// This never fails in practice but returns a [`Result`] to match the
/// fallible subsystems it sits alongside.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber.with(fmt::layer().json()).init(),
        _ => subscriber.with(fmt::layer()).init(),
    }

    Ok(())
}
