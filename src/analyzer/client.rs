use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{
    utils, ContractSummary, ExplorerResponse, TransactionHistory, TransactionRecord,
    UserEngagementResponse, UserRecord,
};
use crate::error::{AnalyzerError, AnalyzerResult};

pub const DEFAULT_EXPLORER_URL: &str = "https://api.etherscan.io/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP settings shared by every request the analyzer issues
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub explorer_url: String,
    pub explorer_api_key: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            explorer_api_key: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("dapp-analyzer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Client for the node endpoint and the block explorer API
#[derive(Debug)]
pub struct DataClient {
    http: Client,
    node_url: String,
    config: ClientConfig,
}

impl DataClient {
    pub fn new(node_url: &str, config: ClientConfig) -> AnalyzerResult<Self> {
        let node_url = utils::validate_node_url(node_url)?;
        if config.timeout.is_zero() {
            return Err(AnalyzerError::InvalidInput(
                "Request timeout must be greater than zero".to_string(),
            ));
        }
        Url::parse(&config.explorer_url).map_err(|e| {
            AnalyzerError::InvalidInput(format!(
                "Invalid explorer URL: '{}'. Error: {}",
                config.explorer_url, e
            ))
        })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(AnalyzerError::ClientBuild)?;

        Ok(Self {
            http,
            node_url,
            config,
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Fetch the raw contract code from the node
    pub async fn fetch_contract_code(&self, contract: &str) -> AnalyzerResult<String> {
        let url = self.node_endpoint(&format!("contracts/{}", contract), None)?;
        self.execute(self.http.get(url.clone()), &url).await
    }

    /// Fetch the explorer's source-code summary for a contract
    pub async fn fetch_contract_summary(&self, contract: &str) -> AnalyzerResult<ContractSummary> {
        let mut url = self.explorer_endpoint()?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("module", "proxy")
                .append_pair("action", "eth_getSourceCode")
                .append_pair("address", contract);
            if let Some(api_key) = &self.config.explorer_api_key {
                query.append_pair("apikey", api_key);
            }
        }

        let body = self.execute(self.http.post(url.clone()), &url).await?;
        let response: ExplorerResponse = decode("explorer", &body)?;
        Ok(response.result.contract_summary)
    }

    /// Fetch contract code then the explorer summary; the code itself is not used
    pub async fn fetch_contract_analysis(&self, contract: &str) -> AnalyzerResult<ContractSummary> {
        let code = self.fetch_contract_code(contract).await?;
        debug!("Fetched {} bytes of contract code for {}", code.len(), contract);
        self.fetch_contract_summary(contract).await
    }

    /// Fetch the transaction history of a contract
    pub async fn fetch_transactions(&self, contract: &str) -> AnalyzerResult<Vec<TransactionRecord>> {
        let url = self.node_endpoint("transactions", Some(contract))?;
        let body = self.execute(self.http.get(url.clone()), &url).await?;
        let history: TransactionHistory = decode("transactions", &body)?;
        Ok(history.result)
    }

    /// Fetch the user records of a contract
    pub async fn fetch_users(&self, contract: &str) -> AnalyzerResult<Vec<UserRecord>> {
        let url = self.node_endpoint("users", Some(contract))?;
        let body = self.execute(self.http.get(url.clone()), &url).await?;
        let users: UserEngagementResponse = decode("users", &body)?;
        Ok(users.result)
    }

    fn node_endpoint(&self, path: &str, contract: Option<&str>) -> AnalyzerResult<Url> {
        let raw = format!("{}/{}", self.node_url, path);
        let mut url = Url::parse(&raw).map_err(|e| {
            AnalyzerError::InvalidInput(format!("Invalid request URL: '{}'. Error: {}", raw, e))
        })?;
        if let Some(contract) = contract {
            url.query_pairs_mut().append_pair("contract", contract);
        }
        Ok(url)
    }

    fn explorer_endpoint(&self) -> AnalyzerResult<Url> {
        Url::parse(&self.config.explorer_url).map_err(|e| {
            AnalyzerError::InvalidInput(format!(
                "Invalid explorer URL: '{}'. Error: {}",
                self.config.explorer_url, e
            ))
        })
    }

    async fn execute(&self, request: RequestBuilder, url: &Url) -> AnalyzerResult<String> {
        debug!("Requesting {}", url);

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| network_error(url, e))?;

        response.text().await.map_err(|e| network_error(url, e))
    }
}

fn network_error(url: &Url, source: reqwest::Error) -> AnalyzerError {
    AnalyzerError::Network {
        url: url.to_string(),
        message: utils::interpret_http_error(&source),
        source,
    }
}

/// Decode a response body: malformed JSON is a parse error, a well-formed
/// document of the wrong shape is a missing-field error.
fn decode<T: DeserializeOwned>(endpoint: &'static str, body: &str) -> AnalyzerResult<T> {
    let value: Value =
        serde_json::from_str(body).map_err(|source| AnalyzerError::Parse { endpoint, source })?;
    serde_json::from_value(value).map_err(|source| AnalyzerError::MissingField { endpoint, source })
}
