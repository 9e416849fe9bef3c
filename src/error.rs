use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error while requesting {url}: {message}")]
    Network {
        url: String,
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {endpoint} response as JSON: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected {endpoint} response shape: {source}")]
    MissingField {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot compute {metric}: the result array is empty")]
    DivideByZero { metric: &'static str },

    #[error("Computed {metric} is not a finite number")]
    NonFiniteMetric { metric: &'static str },

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

pub type AnalyzerResult<T> = std::result::Result<T, AnalyzerError>;
