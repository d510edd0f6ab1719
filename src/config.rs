//! Host-supplied orchestrator configuration.
//!
//! This is deliberately separate from the pure evaluation path: [`Policy`]
//! and [`crate::orchestrator::authorize`] take everything they need as
//! arguments and never read environment variables or files. `OrchestratorConfig`
//! holds the handful of deployment-specific facts — the local admin group,
//! any additional interfaces treated as always-allowed standard bus
//! plumbing — that the embedding application loads once at startup and
//! passes in.

use std::path::Path;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Deployment-specific facts the orchestrator needs beyond the policy tree
/// and the per-message peer/session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Security group id treated as the local admin group for the
    /// admin-gated permission-management members (§4.8).
    pub admin_group_id: Option<String>,
    /// Interface names treated as always-allowed standard bus plumbing, in
    /// addition to the built-in set (§4.8 step 1).
    pub extra_standard_interfaces: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            admin_group_id: None,
            extra_standard_interfaces: Vec::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from an optional YAML file, layered under the
    /// `BUS_AUTHZ_` prefixed environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is given but does not exist, or if the
    /// merged configuration cannot be deserialized.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::invalid_data(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("BUS_AUTHZ_").split("__"));

        figment
            .extract()
            .map_err(|e| Error::invalid_data(e.to_string()))
    }

    /// Configuration with no file or environment overlay.
    #[must_use]
    pub fn defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_admin_group() {
        let cfg = OrchestratorConfig::defaults();
        assert_eq!(cfg.admin_group_id, None);
        assert!(cfg.extra_standard_interfaces.is_empty());
    }

    #[test]
    fn load_with_missing_file_errors() {
        let path = Path::new("/nonexistent/bus-authz.yaml");
        assert!(OrchestratorConfig::load(Some(path)).is_err());
    }

    #[test]
    fn load_with_no_path_falls_back_to_defaults() {
        let cfg = OrchestratorConfig::load(None).unwrap();
        assert_eq!(cfg.admin_group_id, None);
    }
}
