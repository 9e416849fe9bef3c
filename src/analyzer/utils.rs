use reqwest::Url;

use crate::error::{AnalyzerError, AnalyzerResult};

/// Validates a contract identifier; it is kept verbatim
pub fn validate_contract_identifier(contract: &str) -> AnalyzerResult<String> {
    if contract.is_empty() {
        return Err(AnalyzerError::InvalidInput(
            "Contract identifier cannot be empty".to_string(),
        ));
    }

    if let Some(c) = contract
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#'))
    {
        return Err(AnalyzerError::InvalidInput(format!(
            "Invalid contract identifier: '{}'. It cannot contain {:?}",
            contract, c
        )));
    }

    Ok(contract.to_string())
}

/// Validates a node base URL and returns it without trailing slashes
pub fn validate_node_url(node_url: &str) -> AnalyzerResult<String> {
    let node_url = node_url.trim().trim_end_matches('/');

    if node_url.is_empty() {
        return Err(AnalyzerError::InvalidInput(
            "Node URL cannot be empty".to_string(),
        ));
    }

    let parsed = Url::parse(node_url).map_err(|e| {
        AnalyzerError::InvalidInput(format!("Invalid node URL: '{}'. Error: {}", node_url, e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AnalyzerError::InvalidInput(format!(
            "Invalid node URL: '{}'. Only http and https endpoints are supported",
            node_url
        )));
    }

    // Request paths are appended to the base, so it must end at the path
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(AnalyzerError::InvalidInput(format!(
            "Invalid node URL: '{}'. It cannot carry a query string or fragment",
            node_url
        )));
    }

    Ok(node_url.to_string())
}

/// Creates user-friendly error messages for failed HTTP requests
pub fn interpret_http_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        return "Request timed out. The endpoint may be overloaded or unreachable.".to_string();
    }

    if error.is_connect() {
        return "Cannot connect to endpoint. Check your internet connection and URL configuration."
            .to_string();
    }

    match error.status().map(|s| s.as_u16()) {
        Some(404) => {
            "Endpoint returned 404 Not Found. The contract may be unknown to this node.".to_string()
        }
        Some(429) => {
            "Rate limit exceeded. Try again in a few moments or configure an API key.".to_string()
        }
        Some(401) | Some(403) => {
            "Endpoint rejected the request as unauthorized. Check your API key or project id."
                .to_string()
        }
        Some(code) if code >= 500 => format!("Endpoint failed with server error {}", code),
        Some(code) => format!("Endpoint returned HTTP {}", code),
        None => error.to_string(),
    }
}
