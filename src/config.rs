use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::analyzer::client::{ClientConfig, DEFAULT_EXPLORER_URL};

const PROJECT_ID_PLACEHOLDER: &str = "YOUR_PROJECT_ID";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub contract: String,
    pub node_url: String,
    pub explorer: ExplorerConfig,
    pub http: HttpConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub pretty: bool,
    pub concurrent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract: "0x1234567890abcdef".to_string(),
            node_url: format!("https://mainnet.infura.io/v3/{}", PROJECT_ID_PLACEHOLDER),
            explorer: ExplorerConfig::default(),
            http: HttpConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_EXPLORER_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    #[allow(dead_code)]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow!("Failed to create config directory {:?}: {}", parent, e)
                })?;
            }
        }

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path, e))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut config = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(config) => {
                    tracing::info!("Loaded configuration from file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        config.apply_env_vars();
        config
    }

    /// Apply environment variable substitutions to configuration
    fn apply_env_vars(&mut self) {
        self.apply_env(
            std::env::var("INFURA_PROJECT_ID").ok(),
            std::env::var("ETHERSCAN_API_KEY").ok(),
        );
    }

    fn apply_env(&mut self, infura_project_id: Option<String>, etherscan_key: Option<String>) {
        if let Some(project_id) = infura_project_id {
            if self.node_url.contains(PROJECT_ID_PLACEHOLDER) {
                tracing::info!("Using INFURA_PROJECT_ID environment variable for node URL");
                self.node_url = self.node_url.replace(PROJECT_ID_PLACEHOLDER, &project_id);
            }
        } else if self.node_url.contains(PROJECT_ID_PLACEHOLDER) {
            tracing::warn!(
                "Node URL still contains {}, set INFURA_PROJECT_ID or pass --node-url",
                PROJECT_ID_PLACEHOLDER
            );
        }

        if self.explorer.api_key.is_none() {
            if let Some(key) = etherscan_key {
                tracing::debug!("ETHERSCAN_API_KEY found, will be sent to the explorer");
                self.explorer.api_key = Some(key);
            }
        }
    }

    /// HTTP client settings derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig {
            explorer_url: self.explorer.api_url.clone(),
            explorer_api_key: self.explorer.api_key.clone(),
            timeout: Duration::from_secs(self.http.timeout_secs),
            ..ClientConfig::default()
        };
        if let Some(user_agent) = &self.http.user_agent {
            client.user_agent = user_agent.clone();
        }
        client
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("dapp-analyzer").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# dApp Analyzer Configuration File

# Contract to analyze
contract = "0x1234567890abcdef"

# Node base URL; /contracts, /transactions and /users are requested under it
node_url = "https://mainnet.infura.io/v3/YOUR_PROJECT_ID"

[explorer]
api_url = "https://api.etherscan.io/api"
# api_key = "YOUR_ETHERSCAN_API_KEY"

[http]
timeout_secs = 30
# user_agent = "dapp-analyzer"

[report]
pretty = false
# Issue the node and explorer requests concurrently
concurrent = false

# Environment variables that can be used:
# INFURA_PROJECT_ID - replaces YOUR_PROJECT_ID in node_url
# ETHERSCAN_API_KEY - explorer API key when api_key is not set above
"#;
        sample_config.to_string()
    }
}
