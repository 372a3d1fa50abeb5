//! Agent configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use kbb_core::protocol::Intent;
use kbb_core::{TaskDefaults, WikiDefaults, DEFAULT_AGENT_NAME, DEFAULT_SUPERVISOR_ID};

/// Environment variable holding the LLM API key
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the LLM base URL
pub const ENV_BASE_URL: &str = "OPENAI_API_BASE_URL";
/// Environment variable overriding the LLM model
pub const ENV_MODEL: &str = "OPENAI_MODEL";
/// Environment variable overriding the LLM request timeout (milliseconds)
pub const ENV_TIMEOUT_MS: &str = "OPENAI_TIMEOUT_MS";

/// Which primary intent a deployment serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentVariant {
    /// `create_task` backed by the LLM and the task database
    Tasks,
    /// `update_wiki` backed by the wiki document
    #[default]
    Wiki,
}

impl AgentVariant {
    pub fn primary_intent(&self) -> Intent {
        match self {
            AgentVariant::Tasks => Intent::CreateTask,
            AgentVariant::Wiki => Intent::UpdateWiki,
        }
    }

    /// Primary intent followed by `health_check`
    pub fn supported_intents(&self) -> [Intent; 2] {
        [self.primary_intent(), Intent::HealthCheck]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentVariant::Tasks => "tasks",
            AgentVariant::Wiki => "wiki",
        }
    }
}

impl std::str::FromStr for AgentVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tasks" | "task" => Ok(AgentVariant::Tasks),
            "wiki" => Ok(AgentVariant::Wiki),
            other => Err(format!("unknown agent variant '{}' (expected 'tasks' or 'wiki')", other)),
        }
    }
}

impl std::fmt::Display for AgentVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Worker agent settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Name requests must address
    pub agent_name: String,

    /// Supervisor this worker reports to
    pub supervisor_id: String,

    pub variant: AgentVariant,

    /// Response cache file
    pub cache_path: PathBuf,

    /// Wiki document
    pub wiki_path: PathBuf,

    /// SQLite task database
    pub task_db_path: PathBuf,

    /// Confidence reported for created tasks
    pub task_confidence: f64,

    pub task_defaults: TaskDefaults,

    pub wiki_defaults: WikiDefaults,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            supervisor_id: DEFAULT_SUPERVISOR_ID.to_string(),
            variant: AgentVariant::default(),
            cache_path: PathBuf::from("LTM/cache.json"),
            wiki_path: PathBuf::from("LTM/wiki.md"),
            task_db_path: PathBuf::from("LTM/tasks.db"),
            task_confidence: 0.95,
            task_defaults: TaskDefaults::default(),
            wiki_defaults: WikiDefaults::default(),
        }
    }
}

impl AgentSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    pub fn with_variant(mut self, variant: AgentVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Put the cache, wiki and task database under one directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.cache_path = dir.join("cache.json");
        self.wiki_path = dir.join("wiki.md");
        self.task_db_path = dir.join("tasks.db");
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }
}

/// Settings for the OpenAI-compatible completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,

    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    pub timeout_ms: u64,

    pub temperature: f64,

    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: ENV_API_KEY.to_string(),
            timeout_ms: 30_000,
            temperature: 0.2,
            max_tokens: None,
        }
    }
}

impl LlmSettings {
    /// Apply `OPENAI_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(timeout_ms) => self.timeout_ms = timeout_ms,
                Err(_) => tracing::warn!("Ignoring invalid {}={:?}", ENV_TIMEOUT_MS, raw),
            }
        }
    }

    /// Read the API key from the configured variable; blank counts as unset
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}
