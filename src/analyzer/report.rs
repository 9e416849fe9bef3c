use serde_json::Number;
use tracing::{debug, info};

use super::{
    client::{ClientConfig, DataClient},
    metrics, utils, AnalysisResults, ContractSummary, Report, UserEngagement,
};
use crate::error::AnalyzerResult;

/// Runs the contract analyses against one node and assembles the report.
#[derive(Debug)]
pub struct ReportGenerator {
    contract: String,
    client: DataClient,
    results: AnalysisResults,
}

impl ReportGenerator {
    /// No request is issued until one of the `analyze_*` methods is called.
    pub fn new(contract: &str, node_url: &str, config: ClientConfig) -> AnalyzerResult<Self> {
        let contract = utils::validate_contract_identifier(contract)?;
        let client = DataClient::new(node_url, config)?;

        debug!(
            "Created report generator for {} against {}",
            contract,
            client.node_url()
        );

        Ok(Self {
            contract,
            client,
            results: AnalysisResults::default(),
        })
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    #[allow(dead_code)]
    pub fn results(&self) -> &AnalysisResults {
        &self.results
    }

    pub async fn analyze_smart_contract(&mut self) -> AnalyzerResult<()> {
        let summary = self.client.fetch_contract_analysis(&self.contract).await?;
        self.record_contract_summary(summary);
        Ok(())
    }

    pub async fn analyze_transaction_volume(&mut self) -> AnalyzerResult<()> {
        let transactions = self.client.fetch_transactions(&self.contract).await?;
        debug!("Fetched {} transactions", transactions.len());
        let volume = metrics::transaction_volume(&transactions)?;
        self.record_transaction_volume(volume);
        Ok(())
    }

    pub async fn analyze_user_engagement(&mut self) -> AnalyzerResult<()> {
        let users = self.client.fetch_users(&self.contract).await?;
        debug!("Fetched {} user records", users.len());
        let engagement = metrics::user_engagement(&users)?;
        self.record_user_engagement(engagement);
        Ok(())
    }

    /// Run every analysis one after the other, stopping at the first failure.
    pub async fn analyze_all(&mut self) -> AnalyzerResult<()> {
        self.analyze_smart_contract().await?;
        self.analyze_transaction_volume().await?;
        self.analyze_user_engagement().await
    }

    /// Issue the requests of every analysis at once. Results are only
    /// recorded once all of them succeeded.
    pub async fn analyze_all_concurrently(&mut self) -> AnalyzerResult<()> {
        let (summary, transactions, users) = tokio::try_join!(
            self.client.fetch_contract_analysis(&self.contract),
            self.client.fetch_transactions(&self.contract),
            self.client.fetch_users(&self.contract),
        )?;

        let volume = metrics::transaction_volume(&transactions)?;
        let engagement = metrics::user_engagement(&users)?;

        self.record_contract_summary(summary);
        self.record_transaction_volume(volume);
        self.record_user_engagement(engagement);
        Ok(())
    }

    /// Serialize the contract and the metrics collected so far.
    pub fn generate_report(&self) -> AnalyzerResult<String> {
        Ok(serde_json::to_string(&self.report())?)
    }

    pub fn generate_report_pretty(&self) -> AnalyzerResult<String> {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }

    fn report(&self) -> Report<'_> {
        Report {
            dapp_contract: &self.contract,
            analysis_results: &self.results,
        }
    }

    fn record_contract_summary(&mut self, summary: ContractSummary) {
        info!(
            "Cyclomatic complexity: {}, lines of code: {}",
            summary.cyclomatic_complexity, summary.lines_of_code
        );
        self.results.cyclomatic_complexity = Some(summary.cyclomatic_complexity);
        self.results.lines_of_code = Some(summary.lines_of_code);
    }

    fn record_transaction_volume(&mut self, volume: Number) {
        info!("Transaction volume: {}", volume);
        self.results.transaction_volume = Some(volume);
    }

    fn record_user_engagement(&mut self, engagement: UserEngagement) {
        info!(
            "Unique wallets: {}, transactions per user: {}",
            engagement.unique_wallets, engagement.transactions_per_user
        );
        self.results.user_engagement = Some(engagement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use httpmock::prelude::*;
    use serde_json::{json, Number, Value};
    use std::time::Duration;

    const CONTRACT: &str = "0x1234567890abcdef";

    fn test_config(server: &MockServer) -> ClientConfig {
        ClientConfig {
            explorer_url: server.url("/api"),
            explorer_api_key: None,
            timeout: Duration::from_secs(5),
            user_agent: "dapp-analyzer-test".to_string(),
        }
    }

    async fn mock_node(server: &MockServer, transactions: Value, users: Value) {
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/contracts/{}", CONTRACT));
                then.status(200).body("0x6080604052");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api")
                    .query_param("address", CONTRACT);
                then.status(200).json_body(json!({
                    "result": {
                        "contractSummary": {
                            "cyclomaticComplexity": 7,
                            "linesOfCode": 250
                        }
                    }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/transactions")
                    .query_param("contract", CONTRACT);
                then.status(200).json_body(json!({ "result": transactions }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/users")
                    .query_param("contract", CONTRACT);
                then.status(200).json_body(json!({ "result": users }));
            })
            .await;
    }

    fn generator(server: &MockServer) -> ReportGenerator {
        ReportGenerator::new(CONTRACT, &server.base_url(), test_config(server)).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_inputs() {
        let config = ClientConfig::default();
        assert!(matches!(
            ReportGenerator::new("", "http://localhost:8545", config.clone()),
            Err(AnalyzerError::InvalidInput(_))
        ));
        assert!(matches!(
            ReportGenerator::new(CONTRACT, "", config),
            Err(AnalyzerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_report_before_any_analysis() {
        let generator = ReportGenerator::new(
            CONTRACT,
            "http://localhost:8545",
            ClientConfig::default(),
        )
        .unwrap();

        assert_eq!(
            generator.generate_report().unwrap(),
            r#"{"dapp_contract":"0x1234567890abcdef","analysis_results":{}}"#
        );
    }

    #[tokio::test]
    async fn test_full_report() {
        let server = MockServer::start_async().await;
        mock_node(
            &server,
            json!([{"value": 10}, {"value": 20}, {"value": 30}]),
            json!([{"transactions": 2}, {"transactions": 4}]),
        )
        .await;

        let mut generator = generator(&server);
        generator.analyze_all().await.unwrap();

        assert_eq!(
            generator.generate_report().unwrap(),
            concat!(
                r#"{"dapp_contract":"0x1234567890abcdef","analysis_results":{"#,
                r#""cyclomatic_complexity":7,"lines_of_code":250,"transaction_volume":20,"#,
                r#""user_engagement":{"unique_wallets":2,"transactions_per_user":3}}}"#
            )
        );
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let server = MockServer::start_async().await;
        mock_node(
            &server,
            json!([{"value": 1.5}, {"value": 2.5}]),
            json!([{"transactions": 3, "wallet": "0xa"}, {"transactions": 3, "wallet": "0xa"}]),
        )
        .await;

        let mut sequential = generator(&server);
        sequential.analyze_all().await.unwrap();
        let mut concurrent = generator(&server);
        concurrent.analyze_all_concurrently().await.unwrap();

        assert_eq!(sequential.results(), concurrent.results());
        assert_eq!(
            concurrent.results().transaction_volume,
            Number::from_f64(2.0)
        );
        let engagement = concurrent.results().user_engagement.as_ref().unwrap();
        assert_eq!(engagement.unique_wallets, 1);
    }

    #[tokio::test]
    async fn test_report_contains_only_completed_analyses() {
        let server = MockServer::start_async().await;
        mock_node(&server, json!([{"value": 4}]), json!([])).await;

        let mut generator = generator(&server);
        generator.analyze_transaction_volume().await.unwrap();
        let err = generator.analyze_user_engagement().await.unwrap_err();
        assert!(matches!(err, AnalyzerError::DivideByZero { .. }));

        let report: Value = serde_json::from_str(&generator.generate_report().unwrap()).unwrap();
        let object = report.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["dapp_contract"], json!(CONTRACT));
        assert_eq!(object["analysis_results"], json!({"transaction_volume": 4}));
    }

    #[tokio::test]
    async fn test_empty_transactions_fail() {
        let server = MockServer::start_async().await;
        mock_node(&server, json!([]), json!([{"transactions": 1}])).await;

        let mut generator = generator(&server);
        let err = generator.analyze_transaction_volume().await.unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::DivideByZero {
                metric: "transaction_volume"
            }
        ));
        assert!(generator.results().transaction_volume.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_failure_records_nothing() {
        let server = MockServer::start_async().await;
        mock_node(&server, json!([]), json!([{"transactions": 1}])).await;

        let mut generator = generator(&server);
        assert!(generator.analyze_all_concurrently().await.is_err());
        assert_eq!(generator.results(), &AnalysisResults::default());
    }

    #[tokio::test]
    async fn test_missing_contract_summary() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/contracts/{}", CONTRACT));
                then.status(200).body("");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api");
                then.status(200).json_body(json!({
                    "status": "0",
                    "message": "NOTOK",
                    "result": "Invalid API Key"
                }));
            })
            .await;

        let mut generator = generator(&server);
        let err = generator.analyze_smart_contract().await.unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::MissingField {
                endpoint: "explorer",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_contract_code_failure_aborts_analysis() {
        let server = MockServer::start_async().await;
        let explorer = server
            .mock_async(|when, then| {
                when.method(POST).path("/api");
                then.status(200).body("{}");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/contracts/{}", CONTRACT));
                then.status(500);
            })
            .await;

        let mut generator = generator(&server);
        let err = generator.analyze_smart_contract().await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Network { .. }));
        explorer.assert_hits_async(0).await;
    }
}
