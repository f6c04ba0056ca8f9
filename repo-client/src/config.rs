use camino::Utf8Path as Path;
use color_eyre::eyre::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlRepository {
    url: String,
    username: Option<String>,
    password: Option<String>,
    read_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlConfig {
    #[serde(rename = "Repository")]
    repository: TomlRepository,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub base_url: String,
    /// Credentials for HTTP basic auth, or None for anonymous access.
    pub username: Option<String>,
    pub password: Option<String>,
    pub read_only: bool,
}

pub async fn read_config(path: &Path) -> Result<RepositoryConfig> {
    let toml_str = tokio::fs::read_to_string(path)
        .await
        .context(format!("Error reading config file {}", path))?;
    let toml_config: TomlConfig = toml::from_str(&toml_str).context("Error parsing config file")?;
    let repository = toml_config.repository;
    if repository.url.trim().is_empty() {
        bail!("Repository url must not be blank");
    }
    Ok(RepositoryConfig {
        base_url: repository.url,
        username: repository.username,
        password: repository.password,
        read_only: repository.read_only.unwrap_or(false),
    })
}
