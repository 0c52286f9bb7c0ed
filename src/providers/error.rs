use std::time::Duration;
use thiserror::Error;

/// Failures while resolving credentials or talking to a profile's API.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No API key found for the specified key")]
    NoKeyAvailable,

    #[error("Profile baseUrl is missing")]
    MissingBaseUrl,

    #[error("Invalid auth configuration: {0}")]
    InvalidAuthConfig(String),

    #[error("Invalid test method: {0}")]
    InvalidTestMethod(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{}", describe_http(.0))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// reqwest error text followed by its source chain ("error sending request: ... Connection refused").
fn describe_http(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl ProviderError {
    /// Whether the error happened before any request could be issued.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ProviderError::NoKeyAvailable
                | ProviderError::MissingBaseUrl
                | ProviderError::InvalidAuthConfig(_)
                | ProviderError::InvalidTestMethod(_)
                | ProviderError::InvalidUrl(_)
        )
    }
}
