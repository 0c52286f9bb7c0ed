use crate::cli::ValidationConfig;
use crate::models::ValidationResult;
use crate::providers::openai::{
    chat_request, parse_error_message, parse_model_ids, CHAT_COMPLETIONS_PATH, MODELS_PATH,
};
use crate::providers::{ApiClient, AuthAugmentation, ProviderError};
use reqwest::Method;

const VALIDATED_MESSAGE: &str = "API key validated successfully via chat completions";

/// Outcome of the `/models` phase. Diagnostic only.
#[derive(Debug, Default)]
struct Discovery {
    models: Vec<String>,
    status: Option<u16>,
    error: Option<String>,
}

impl Discovery {
    fn failed(status: Option<u16>, error: String) -> Self {
        Self {
            models: Vec::new(),
            status,
            error: Some(error),
        }
    }

    /// Result skeleton that carries the discovery diagnostics forward.
    fn into_result(self) -> ValidationResult {
        ValidationResult {
            models: self.models,
            models_status: self.status,
            models_error: self.error,
            ..Default::default()
        }
    }
}

async fn discover_models(
    client: &ApiClient,
    base_url: &str,
    auth: &AuthAugmentation,
) -> Discovery {
    let url = match auth.request_url(base_url, MODELS_PATH) {
        Ok(url) => url,
        Err(e) => return Discovery::failed(None, e.to_string()),
    };

    let reply = match client.request(Method::GET, url, &auth.headers, None).await {
        Ok(reply) => reply,
        Err(e) => return Discovery::failed(None, e.to_string()),
    };

    if !reply.is_success() {
        let error = parse_error_message(&reply.body)
            .unwrap_or_else(|| format!("Status {}", reply.status));
        return Discovery::failed(Some(reply.status), error);
    }

    match parse_model_ids(&reply.body) {
        Ok(models) => Discovery {
            models,
            status: Some(reply.status),
            error: None,
        },
        Err(e) => Discovery::failed(
            Some(reply.status),
            format!("Failed to parse models response: {}", e),
        ),
    }
}

async fn probe_completion(
    client: &ApiClient,
    config: &ValidationConfig,
    base_url: &str,
    auth: &AuthAugmentation,
    model: &str,
) -> Result<crate::providers::HttpReply, ProviderError> {
    let url = auth.request_url(base_url, CHAT_COMPLETIONS_PATH)?;
    let body = serde_json::to_value(chat_request(model, &config.probe_message, Some(1)))?;
    client.request(Method::POST, url, &auth.headers, Some(&body)).await
}

/// Two sequential phases: model discovery, then the decisive completion probe.
pub(super) async fn validate(
    client: &ApiClient,
    config: &ValidationConfig,
    base_url: &str,
    auth: &AuthAugmentation,
) -> ValidationResult {
    let discovery = discover_models(client, base_url, auth).await;
    match discovery.error {
        Some(ref e) => tracing::debug!("Model discovery failed: {}", e),
        None => tracing::debug!("Discovered {} models", discovery.models.len()),
    }

    let model = discovery
        .models
        .first()
        .cloned()
        .unwrap_or_else(|| config.fallback_model.clone());

    let outcome = probe_completion(client, config, base_url, auth, &model).await;
    let mut result = discovery.into_result();

    match outcome {
        Ok(reply) if reply.is_success() => {
            result.valid = true;
            result.status = Some(reply.status);
            result.message = Some(VALIDATED_MESSAGE.to_string());
        }
        Ok(reply) => {
            let detail = parse_error_message(&reply.body)
                .unwrap_or_else(|| format!("Status {}", reply.status));
            result.status = Some(reply.status);
            result.error = Some(format!("API key validation failed: {}", detail));
        }
        Err(e) => {
            result.error = Some(format!("Chat completions test failed: {}", e));
        }
    }
    result
}
