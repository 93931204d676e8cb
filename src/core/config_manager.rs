// src/core/config_manager.rs
//! Configuration: secrets from the environment, tuning from an optional file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::core::persona::Persona;
use crate::discovery::model_client::{ChatClient, GeminiClient, GenerativeModel};
use crate::discovery::profile_selector::RetryPolicy;
use crate::discovery::response::ResponseFormat;
use crate::discovery::{BatchRunner, ProfileSelector, SearchClient};

pub const CONFIG_PATH_VAR: &str = "FOUNDER_FINDER_CONFIG";
const DEFAULT_CONFIG_FILES: [&str; 3] = ["founder_finder.yaml", "founder_finder.yml", "founder_finder.toml"];

const GEMINI_MODELS: [&str; 3] = ["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"];
const CHAT_MODELS: [&str; 3] = ["openai/gpt-4o-mini", "openai/gpt-4.1-mini", "openai/gpt-4o"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    Gemini,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ModelProvider,
    pub models: Option<Vec<String>>,
    pub response_format: ResponseFormat,
    pub persona: Persona,
    pub roles: Option<Vec<String>>,
    pub search_url: Option<String>,
    pub model_url: Option<String>,
    pub search_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub max_results: u32,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub inter_company_delay_ms: u64,
    pub outreach_context: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            models: None,
            response_format: ResponseFormat::default(),
            persona: Persona::default(),
            roles: None,
            search_url: None,
            model_url: None,
            search_timeout_secs: 10,
            model_timeout_secs: 20,
            max_results: 10,
            max_attempts: 3,
            backoff_base_ms: 2000,
            inter_company_delay_ms: 1000,
            outreach_context: None,
        }
    }
}

impl Settings {
    /// Ordered model fallback list; provider defaults when not configured.
    pub fn model_names(&self) -> Vec<String> {
        match &self.models {
            Some(models) if !models.is_empty() => models.clone(),
            _ => {
                let defaults: &[&str] = match self.provider {
                    ModelProvider::Gemini => &GEMINI_MODELS,
                    ModelProvider::Chat => &CHAT_MODELS,
                };
                defaults.iter().map(|m| m.to_string()).collect()
            }
        }
    }

    pub fn default_roles(&self) -> Vec<String> {
        match &self.roles {
            Some(roles) if !roles.is_empty() => roles.clone(),
            _ => self.persona.keywords(),
        }
    }
}

#[derive(Clone)]
pub struct Secrets {
    pub search_api_key: String,
    pub model_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("search_api_key", &"***")
            .field("model_api_key", &"***")
            .finish()
    }
}

impl Secrets {
    /// Missing credentials are fatal: nothing runs without both keys.
    pub fn from_lookup<F>(provider: ModelProvider, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let search_api_key = non_empty("SERPER_API_KEY")
            .context("SERPER_API_KEY environment variable not set")?;

        let model_api_key = match provider {
            ModelProvider::Gemini => non_empty("GEMINI_API_KEY")
                .context("GEMINI_API_KEY environment variable not set")?,
            ModelProvider::Chat => non_empty("MODEL_API_KEY")
                .or_else(|| non_empty("GITHUB_TOKEN"))
                .context("MODEL_API_KEY (or GITHUB_TOKEN) environment variable not set")?,
        };

        Ok(Self {
            search_api_key,
            model_api_key,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub settings: Settings,
    pub secrets: Secrets,
}

impl ConfigManager {
    /// Load settings (explicit path, env var, or default file names) and
    /// secrets from the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let settings = match Self::locate_settings(config_path) {
            Some(path) => Self::load_settings(&path)?,
            None => {
                info!("No configuration file found, using defaults");
                Settings::default()
            }
        };

        let secrets = Secrets::from_lookup(settings.provider, |name| std::env::var(name).ok())?;

        info!(
            "Configuration loaded: provider={:?}, models={:?}, format={:?}",
            settings.provider,
            settings.model_names(),
            settings.response_format
        );

        Ok(Self { settings, secrets })
    }

    fn locate_settings(config_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = config_path {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            return Some(PathBuf::from(path));
        }
        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    pub fn load_settings(path: &Path) -> Result<Settings> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        info!("Loading configuration from {}", path.display());
        Self::parse_settings(path, &content)
    }

    fn parse_settings(path: &Path, content: &str) -> Result<Settings> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("toml") => toml::from_str(content)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(content)
                .with_context(|| format!("Failed to parse {}", path.display())),
            _ => anyhow::bail!(
                "Unsupported config format: {}. Use .yaml, .yml or .toml",
                path.display()
            ),
        }
    }

    pub fn default_roles(&self) -> Vec<String> {
        self.settings.default_roles()
    }

    pub fn search_client(&self) -> Result<SearchClient> {
        SearchClient::new(
            self.secrets.search_api_key.clone(),
            self.settings.search_url.clone(),
            Duration::from_secs(self.settings.search_timeout_secs),
            self.settings.max_results,
        )
    }

    pub fn model_client(&self) -> Result<Arc<dyn GenerativeModel>> {
        let timeout = Duration::from_secs(self.settings.model_timeout_secs);
        let key = self.secrets.model_api_key.clone();
        let base = self.settings.model_url.clone();

        let client: Arc<dyn GenerativeModel> = match self.settings.provider {
            ModelProvider::Gemini => Arc::new(GeminiClient::new(key, base, timeout)?),
            ModelProvider::Chat => Arc::new(ChatClient::new(key, base, timeout)?),
        };
        Ok(client)
    }

    pub fn profile_selector(&self) -> Result<ProfileSelector> {
        let retry = RetryPolicy {
            max_attempts: self.settings.max_attempts.max(1),
            base_delay: Duration::from_millis(self.settings.backoff_base_ms),
        };

        Ok(ProfileSelector::new(self.model_client()?, self.settings.model_names())
            .with_retry(retry)
            .with_format(self.settings.response_format)
            .with_outreach_context(self.settings.outreach_context.clone()))
    }

    /// Wire the whole pipeline once; callers share the result.
    pub fn build_runner(&self) -> Result<BatchRunner> {
        let search = Arc::new(self.search_client()?);
        Ok(BatchRunner::new(search, self.profile_selector()?, self.default_roles())
            .with_delay(Duration::from_millis(self.settings.inter_company_delay_ms)))
    }
}
