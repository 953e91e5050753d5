use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/dossier.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8350".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per person.
    #[serde(default = "default_upload_root")]
    pub upload_root: PathBuf,
    /// Upload extensions accepted by the web surface (case-insensitive).
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_upload_root() -> PathBuf {
    PathBuf::from("./data/uploads")
}

fn default_allowed_extensions() -> Vec<String> {
    ["txt", "pdf", "png", "jpg", "jpeg", "gif", "docx", "xlsx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    /// `disabled` or `gemini`. The API key comes from `GEMINI_API_KEY`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl SummarizerConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl StorageConfig {
    /// Case-insensitive membership test against the allowed extension list.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.storage.allowed_extensions.is_empty() {
        anyhow::bail!("storage.allowed_extensions must not be empty");
    }

    match config.summarizer.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown summarizer provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }

    if config.summarizer.timeout_secs == 0 {
        anyhow::bail!("summarizer.timeout_secs must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        validate(&config).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8350");
        assert_eq!(config.summarizer.provider, "disabled");
        assert!(config.storage.is_allowed_extension("pdf"));
        assert!(config.storage.is_allowed_extension("PDF"));
        assert!(!config.storage.is_allowed_extension("exe"));
    }

    #[test]
    fn unknown_provider_rejected() {
        let config: Config = toml::from_str("[summarizer]\nprovider = \"openai\"\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config: Config = toml::from_str("[summarizer]\ntimeout_secs = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }
}
