//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{Result, SpreadError};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Find a dataset definition by name.
    pub fn dataset(&self, name: &str) -> Result<&DatasetSpec> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SpreadError::Config(format!("unknown dataset '{}'", name)))
    }

    /// Find a pipeline definition by name.
    pub fn pipeline(&self, name: &str) -> Result<&PipelineSpec> {
        self.pipelines
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SpreadError::Config(format!("unknown pipeline '{}'", name)))
    }
}

impl PortalConfig {
    /// Resolve the portal password from the config or the environment.
    pub fn resolve_password(&self) -> Result<String> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }
        if let Some(var) = &self.password_env {
            return std::env::var(var).map_err(|_| {
                SpreadError::Config(format!(
                    "portal.password_env names '{}' but it is not set",
                    var
                ))
            });
        }
        Err(SpreadError::Config(
            "portal password not configured; set portal.password or portal.password_env".into(),
        ))
    }
}
