pub mod client;
pub mod metrics;
pub mod report;
pub mod utils;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Explorer `eth_getSourceCode` response, reduced to the fields the report uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerResponse {
    pub result: ExplorerResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerResult {
    pub contract_summary: ContractSummary,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    pub cyclomatic_complexity: Number,
    pub lines_of_code: Number,
}

/// Node `/transactions` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionHistory {
    pub result: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRecord {
    pub value: Number,
}

/// Node `/users` response.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEngagementResponse {
    pub result: Vec<UserRecord>,
}

/// A user record as returned by the node. Fields other than `transactions`
/// are kept so that records can be compared as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub transactions: Number,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserEngagement {
    pub unique_wallets: usize,
    pub transactions_per_user: Number,
}

/// Metrics collected so far. A key is present only once the analysis that
/// produces it has run, and is never cleared afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cyclomatic_complexity: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_of_code: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_volume: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_engagement: Option<UserEngagement>,
}

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub dapp_contract: &'a str,
    pub analysis_results: &'a AnalysisResults,
}
