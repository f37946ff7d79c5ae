use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StartupError;
use crate::models::Priority;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub github: GitHubConfig,
    pub models: ModelsConfig,
    pub forum: ForumConfig,
    pub report: ReportConfig,
}

/// Locations of the repository list, ledger and report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub repo_list: PathBuf,
    pub ledger: PathBuf,
    pub report: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            repo_list: PathBuf::from("data/repos_list.csv"),
            ledger: PathBuf::from("data/known_releases.json"),
            report: PathBuf::from("data/nightly_report.md"),
        }
    }
}

/// Release lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base: String,
    /// Upper bound on lookups in flight at once
    pub max_concurrent_lookups: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            max_concurrent_lookups: 16,
        }
    }
}

/// Summarization backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Claude,
}

impl Provider {
    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Claude => "ANTHROPIC_API_KEY",
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub provider: Provider,
    /// Overrides the provider's default model
    pub model: Option<String>,
    /// Overrides the provider's API base URL
    pub base_url: Option<String>,
    /// Length budget stated to the model
    pub max_output_chars: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: None,
            base_url: None,
            max_output_chars: 1800,
        }
    }
}

/// Discord forum configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    /// Posts longer than this are cut and marked
    pub max_content_chars: usize,
    /// Pre-provisioned forum tag id for each priority
    pub tags: BTreeMap<Priority, String>,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 1990,
            tags: default_forum_tags(),
        }
    }
}

fn default_forum_tags() -> BTreeMap<Priority, String> {
    BTreeMap::from([
        (Priority::Breaking, "1469812659598659816".to_string()),
        (Priority::Major, "1469812798006497342".to_string()),
        (Priority::Minor, "1469813003003105321".to_string()),
        (Priority::Bugfix, "1469813299217432596".to_string()),
    ])
}

/// Digest report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Nightly GitHub Pulse Report".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.forum.fill_missing_tags();

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }
}

impl ForumConfig {
    /// A partial `tags` table keeps the built-in ids for priorities it omits
    pub fn fill_missing_tags(&mut self) {
        for (priority, id) in default_forum_tags() {
            self.tags.entry(priority).or_insert(id);
        }
    }
}

/// Raw credential values as collected from flags or the environment
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub github_token: Option<String>,
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub discord_webhook_url: Option<String>,
}

/// Credentials required before a run may start
#[derive(Clone)]
pub struct Credentials {
    pub github_token: String,
    pub model_api_key: String,
    /// Not required for dry runs
    pub discord_webhook_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field("model_api_key", &"<redacted>")
            .field("discord_webhook_url", &self.discord_webhook_url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Check that every credential the run needs is present and non-empty
    pub fn resolve(
        sources: CredentialSources,
        provider: Provider,
        require_webhook: bool,
    ) -> Result<Self, StartupError> {
        let github_token = required(sources.github_token, "GITHUB_TOKEN")?;

        let model_key = match provider {
            Provider::Gemini => sources.gemini_api_key,
            Provider::Claude => sources.anthropic_api_key,
        };
        let model_api_key = required(model_key, provider.api_key_var())?;

        let discord_webhook_url = if require_webhook {
            Some(required(sources.discord_webhook_url, "DISCORD_WEBHOOK_URL")?)
        } else {
            sources.discord_webhook_url.filter(|v| !v.trim().is_empty())
        };

        Ok(Self {
            github_token,
            model_api_key,
            discord_webhook_url,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, StartupError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(StartupError::MissingCredential(name))
}
