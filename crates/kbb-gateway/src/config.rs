//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use kbb_agent::{AgentSettings, AgentVariant, LlmSettings};

use crate::{GatewayError, DEFAULT_HOST, DEFAULT_PORT};

/// Main gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Worker agent settings
    pub agent: AgentSettings,

    /// Completion endpoint settings (tasks variant)
    pub llm: LlmSettings,

    /// Trace every HTTP request
    pub tracing: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            agent: AgentSettings::default(),
            llm: LlmSettings::default(),
            tracing: true,
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the deployment variant
    pub fn with_variant(mut self, variant: AgentVariant) -> Self {
        self.agent.variant = variant;
        self
    }

    /// Keep all persisted state under `dir`
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.agent = self.agent.with_data_dir(dir);
        self
    }

    /// Apply `OPENAI_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        self.llm.apply_env();
        self
    }

    /// Resolve the listen address. Host names go through the system
    /// resolver and the first address wins.
    pub async fn socket_addr(&self) -> crate::Result<SocketAddr> {
        let invalid = |detail: String| {
            GatewayError::InvalidConfig(format!(
                "invalid listen address {}:{}: {}",
                self.host, self.port, detail
            ))
        };

        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| invalid(e.to_string()))?;
        addrs
            .next()
            .ok_or_else(|| invalid("host resolved to no addresses".to_string()))
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.agent.variant, AgentVariant::Wiki);
        assert_eq!(config.socket_addr().await.unwrap().port(), 5000);
    }

    #[tokio::test]
    async fn test_builder() {
        let config = GatewayConfig::new()
            .with_host("0.0.0.0")
            .with_port(8080)
            .with_variant(AgentVariant::Tasks)
            .with_data_dir("/srv/kbb");

        assert_eq!(config.socket_addr().await.unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.agent.variant, AgentVariant::Tasks);
        assert_eq!(config.agent.task_db_path, PathBuf::from("/srv/kbb/tasks.db"));
    }

    #[tokio::test]
    async fn test_bad_host_is_config_error() {
        let config = GatewayConfig::new().with_host("not a host");
        assert!(matches!(
            config.socket_addr().await,
            Err(GatewayError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_localhost_resolves_to_loopback() {
        let config = GatewayConfig::new().with_host("localhost").with_port(5055);
        let addr = config.socket_addr().await.unwrap();

        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 5055);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.json");
        let config = GatewayConfig::new().with_port(7001).with_variant(AgentVariant::Tasks);

        config.to_file(&path).unwrap();
        assert_eq!(GatewayConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.json");
        std::fs::write(&path, r#"{ "port": 9000, "agent": { "variant": "tasks" } }"#).unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.agent.variant, AgentVariant::Tasks);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }
}
