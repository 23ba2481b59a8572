//! Per-domain loop settings.
//!
//! Loaded from the `domains` section of the main config, or from a single
//! YAML file per domain listed under `domains.definitions`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::DomainTag;
use crate::error::{DeskloopError, Result};

/// Settings for one domain's controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub domain: DomainTag,

    /// Attempt ceiling for every task in this domain
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Refine and retry after permission-denied instead of stopping
    #[serde(rename = "retry-permission-denied", default)]
    pub retry_permission_denied: bool,
}

impl DomainConfig {
    /// Built-in settings for a domain
    pub fn for_domain(domain: DomainTag) -> Self {
        Self {
            domain,
            max_attempts: domain.default_max_attempts(),
            retry_permission_denied: false,
        }
    }

    /// Load a domain definition from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(DeskloopError::Config(format!(
                "max-attempts for {} must be at least 1",
                self.domain
            )));
        }
        Ok(())
    }
}

/// Overrides for the three built-in domains
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainsConfig {
    /// Domain definition files; each replaces the built-in settings of its domain
    pub definitions: Vec<PathBuf>,
    pub application: Option<DomainOverride>,
    pub file: Option<DomainOverride>,
    pub editor: Option<DomainOverride>,
}

/// Partial domain settings; unset fields keep the built-in values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainOverride {
    #[serde(rename = "max-attempts")]
    pub max_attempts: Option<u32>,

    #[serde(rename = "retry-permission-denied")]
    pub retry_permission_denied: Option<bool>,
}

impl DomainsConfig {
    /// Built-in settings for a domain with its inline override applied
    pub fn get(&self, domain: DomainTag) -> DomainConfig {
        self.apply_override(DomainConfig::for_domain(domain))
    }

    fn apply_override(&self, mut config: DomainConfig) -> DomainConfig {
        let domain = config.domain;
        let over = match domain {
            DomainTag::Application => &self.application,
            DomainTag::File => &self.file,
            DomainTag::Editor => &self.editor,
        };
        if let Some(over) = over {
            if let Some(max) = over.max_attempts {
                config.max_attempts = max;
            }
            if let Some(retry) = over.retry_permission_denied {
                config.retry_permission_denied = retry;
            }
        }
        config
    }

    /// Effective settings for every domain, validated.
    ///
    /// Definition files replace the built-ins; inline overrides apply on top.
    pub fn all(&self) -> Result<Vec<DomainConfig>> {
        let mut loaded: Vec<DomainConfig> = Vec::new();
        for path in &self.definitions {
            let config = DomainConfig::load_from_file(path).map_err(|e| {
                DeskloopError::Config(format!("domain definition {}: {}", path.display(), e))
            })?;
            if loaded.iter().any(|c| c.domain == config.domain) {
                return Err(DeskloopError::Config(format!(
                    "domain {} is defined more than once ({})",
                    config.domain,
                    path.display()
                )));
            }
            log::debug!("Loaded {} domain from {}", config.domain, path.display());
            loaded.push(config);
        }

        DomainTag::all()
            .into_iter()
            .map(|d| {
                let base = loaded
                    .iter()
                    .find(|c| c.domain == d)
                    .cloned()
                    .unwrap_or_else(|| DomainConfig::for_domain(d));
                let config = self.apply_override(base);
                config.validate()?;
                Ok(config)
            })
            .collect()
    }
}
