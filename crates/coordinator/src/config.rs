//! Process configuration.
//!
//! # Security
//!
//! - Config file permission validation on Unix systems
//! - Rejects world-writable files, and world-readable files holding secrets
//! - Warns about API keys and passwords stored in config files

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use switchboard_agents::{ServiceNowConfig, DEFAULT_MAX_RESULTS, DEFAULT_VECTOR_STORE_ID};
use switchboard_llm::LlmConfig;
use tracing::warn;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    /// Reasoning service used by the classifier and both search backends
    #[serde(default)]
    pub provider: LlmConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub servicenow: ServiceNowConfig,

    #[serde(default)]
    pub ticket: TicketConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Ask the reasoning service
    #[default]
    Llm,
    /// Offline keyword rules
    Keyword,
}

impl FromStr for ClassifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llm" => Ok(Self::Llm),
            "keyword" => Ok(Self::Keyword),
            other => Err(format!("unknown classifier mode '{other}', expected llm or keyword")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub mode: ClassifierMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Document repositories searched by the document backend
    #[serde(default = "default_vector_store_ids")]
    pub vector_store_ids: Vec<String>,

    #[serde(default = "default_max_num_results")]
    pub max_num_results: u32,
}

fn default_vector_store_ids() -> Vec<String> {
    vec![DEFAULT_VECTOR_STORE_ID.to_string()]
}

fn default_max_num_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_store_ids: default_vector_store_ids(),
            max_num_results: default_max_num_results(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Derive incident fields with the reasoning service instead of keywords
    #[serde(default)]
    pub interpret_details: bool,
}

impl SwitchboardConfig {
    /// Load `path` if given, otherwise defaults, then overlay the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// On Unix systems the file must be a regular file, must not be
    /// world-writable, and must not be world-readable when it holds a
    /// provider API key or the ServiceNow password.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = Self::from_file_unchecked(path)?;

        #[cfg(unix)]
        validate_config_file_permissions(path, config.has_secrets())?;

        if config.has_secrets() {
            warn!(
                "Secrets found in config file '{}'. For better security, use environment \
                 variables instead (OPENAI_API_KEY, ANTHROPIC_API_KEY, SN_PASS).",
                path.display()
            );
        }

        Ok(config)
    }

    /// Load configuration from a TOML file without permission checks.
    pub fn from_file_unchecked(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    /// Overlay ServiceNow credentials from `SN_INSTANCE`, `SN_USER`, `SN_PASS`.
    ///
    /// Provider keys are resolved lazily by [`LlmConfig::resolve_api_key`].
    pub fn apply_env(&mut self) {
        self.servicenow.apply_env();
    }

    fn has_secrets(&self) -> bool {
        self.provider.api_key.as_deref().is_some_and(|k| !k.is_empty())
            || self.servicenow.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[cfg(unix)]
fn validate_config_file_permissions(path: &Path, has_secrets: bool) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!(
            "Config path '{}' is not a regular file. Symlinks and directories are not allowed.",
            path.display()
        );
    }

    let permission_bits = metadata.permissions().mode() & 0o777;

    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_secrets && permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains secrets but is world-readable (mode {:04o}). \
             Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_secrets && permission_bits & 0o040 != 0 {
        warn!(
            "Config file '{}' contains secrets and is group-readable (mode {:04o}). \
             Consider restricting access with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL_CONFIG: &str = r#"
[provider]
provider = "openai"
model = "gpt-4o-mini"
timeout_ms = 20000

[classifier]
mode = "keyword"

[search]
vector_store_ids = ["vs_a", "vs_b"]
max_num_results = 5

[servicenow]
instance = "dev12345"
user = "svc-switchboard"
timeout_ms = 10000
category = "Hardware"

[ticket]
interpret_details = true
"#;

    fn write_config(content: &str, mode: u32) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(mode)).unwrap();
        }
        #[cfg(not(unix))]
        let _ = mode;
        file
    }

    #[test]
    fn defaults() {
        let config = SwitchboardConfig::default();
        assert_eq!(config.classifier.mode, ClassifierMode::Llm);
        assert_eq!(config.search.vector_store_ids, vec![DEFAULT_VECTOR_STORE_ID]);
        assert_eq!(config.search.max_num_results, 3);
        assert_eq!(config.servicenow.timeout_ms, 15_000);
        assert_eq!(config.provider.timeout_ms, 30_000);
        assert!(!config.ticket.interpret_details);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: SwitchboardConfig = toml::from_str("").unwrap();
        assert_eq!(config.search.vector_store_ids, vec![DEFAULT_VECTOR_STORE_ID]);
        assert_eq!(config.provider.provider, "openai");
    }

    #[test]
    fn full_file_parses() {
        let file = write_config(FULL_CONFIG, 0o600);
        let config = SwitchboardConfig::from_file(file.path()).unwrap();

        assert_eq!(config.provider.timeout_ms, 20_000);
        assert_eq!(config.classifier.mode, ClassifierMode::Keyword);
        assert_eq!(config.search.vector_store_ids, vec!["vs_a", "vs_b"]);
        assert_eq!(config.search.max_num_results, 5);
        assert_eq!(config.servicenow.instance.as_deref(), Some("dev12345"));
        assert_eq!(config.servicenow.timeout_ms, 10_000);
        assert_eq!(config.servicenow.category.as_deref(), Some("Hardware"));
        assert!(config.ticket.interpret_details);
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let file = write_config("[classifier]\nmode = \"dice\"\n", 0o600);
        assert!(SwitchboardConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn classifier_mode_from_str() {
        assert_eq!("LLM".parse::<ClassifierMode>().unwrap(), ClassifierMode::Llm);
        assert_eq!("keyword".parse::<ClassifierMode>().unwrap(), ClassifierMode::Keyword);
        assert!("regex".parse::<ClassifierMode>().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn world_writable_file_is_rejected() {
        let file = write_config("[classifier]\nmode = \"llm\"\n", 0o666);
        let err = SwitchboardConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-writable"));
    }

    #[cfg(unix)]
    #[test]
    fn world_readable_secrets_are_rejected() {
        let file = write_config("[servicenow]\npassword = \"hunter2\"\n", 0o644);
        let err = SwitchboardConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-readable"));
    }

    #[cfg(unix)]
    #[test]
    fn world_readable_without_secrets_is_fine() {
        let file = write_config("[search]\nvector_store_ids = [\"vs_x\"]\n", 0o644);
        let config = SwitchboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.search.vector_store_ids, vec!["vs_x"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(SwitchboardConfig::from_file("/nonexistent/switchboard.toml").is_err());
    }
}
