use super::error::ProviderError;
use crate::cli::TimeoutConfig;
use indexmap::IndexMap;
use reqwest::{Client, Method};
use std::time::Duration;
use url::Url;

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Build an optimized reqwest::Client for profile API calls.
///
/// Applies: TCP_NODELAY, connect timeout (fail-fast) and a small idle pool;
/// each call is short-lived and independent.
pub fn build_http_client(connect_timeout: Duration) -> Client {
    Client::builder()
        .tcp_nodelay(true)
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .user_agent(concat!("akm/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// URL without its query string, safe to log when a secret rides in the query.
pub fn loggable_url(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

/// HTTP client used against profile APIs. Every request runs under a deadline;
/// nothing is retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    deadline: Duration,
}

impl ApiClient {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        Self::with_deadline(
            Duration::from_millis(timeouts.request_timeout_ms),
            Duration::from_millis(timeouts.connect_timeout_ms),
        )
    }

    pub fn with_deadline(deadline: Duration, connect_timeout: Duration) -> Self {
        Self {
            client: build_http_client(connect_timeout),
            deadline,
        }
    }

    /// Issue one request and read the whole body before the deadline expires.
    pub async fn request(
        &self,
        method: Method,
        url: Url,
        headers: &IndexMap<String, String>,
        body: Option<&serde_json::Value>,
    ) -> Result<HttpReply, ProviderError> {
        let target = loggable_url(&url);
        tracing::debug!("{} {}", method, target);

        let mut req_builder = self.client.request(method.clone(), url);
        for (name, value) in headers {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            req_builder = req_builder
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(body)?);
        }

        let deadline = self.deadline;
        let exchange = async move {
            let response = req_builder.timeout(deadline).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpReply { status, body })
        };

        match tokio::time::timeout(deadline, exchange).await {
            Ok(Ok(reply)) => {
                tracing::debug!("{} {} -> {}", method, target, reply.status);
                Ok(reply)
            }
            Ok(Err(e)) if e.is_timeout() => {
                tracing::warn!("{} {} timed out", method, target);
                Err(ProviderError::Timeout(deadline))
            }
            Ok(Err(e)) => {
                tracing::warn!("{} {} failed: {}", method, target, e);
                Err(ProviderError::Http(e.without_url()))
            }
            Err(_) => {
                tracing::warn!("{} {} exceeded deadline", method, target);
                Err(ProviderError::Timeout(deadline))
            }
        }
    }
}
