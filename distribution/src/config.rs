use camino::{Utf8Path as Path, Utf8PathBuf as PathBuf};
use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

use crate::error::DistributionError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlDistribution {
    url: Option<String>,
    admin_username: Option<String>,
    admin_password: Option<String>,
    distribution_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlConfig {
    #[serde(rename = "Distribution")]
    distribution: TomlDistribution,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistributionConfig {
    pub base_url: String,
    pub admin_username: String,
    pub admin_password: String,
    pub distribution_dir: Option<PathBuf>,
}

impl DistributionConfig {
    /// Required settings are validated for presence only, and only when an
    /// operation actually needs them.
    pub fn validate(&self) -> Result<(), DistributionError> {
        if self.base_url.trim().is_empty() {
            return Err(DistributionError::Configuration(
                "video platform url must be set".to_string(),
            ));
        }
        if self.admin_username.trim().is_empty() {
            return Err(DistributionError::Configuration(
                "video platform admin username must be set".to_string(),
            ));
        }
        if self.admin_password.trim().is_empty() {
            return Err(DistributionError::Configuration(
                "video platform admin password must be set".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn read_config(path: &Path) -> Result<DistributionConfig> {
    let toml_str = tokio::fs::read_to_string(path)
        .await
        .context(format!("Error reading config file {}", path))?;
    let toml_config: TomlConfig = toml::from_str(&toml_str).context("Error parsing config file")?;
    let distribution = toml_config.distribution;
    if distribution.url.is_none() {
        tracing::warn!("video platform url is not set");
    }
    if distribution.admin_username.is_none() {
        tracing::warn!("video platform admin username is not set");
    }
    if distribution.admin_password.is_none() {
        tracing::warn!("video platform admin password is not set");
    }
    Ok(DistributionConfig {
        base_url: distribution.url.unwrap_or_default(),
        admin_username: distribution.admin_username.unwrap_or_default(),
        admin_password: distribution.admin_password.unwrap_or_default(),
        distribution_dir: distribution.distribution_dir.map(PathBuf::from),
    })
}
