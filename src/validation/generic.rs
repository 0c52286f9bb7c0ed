use crate::cli::ValidationConfig;
use crate::models::ValidationResult;
use crate::providers::{ApiClient, AuthAugmentation, ProfileSettings};

/// Parsed body for the result, bounded by `max_bytes`. Non-JSON bodies become a JSON string.
fn bounded_response(body: &str, max_bytes: usize) -> (Option<serde_json::Value>, Option<String>) {
    if body.len() > max_bytes {
        return (
            None,
            Some(format!("Response body of {} bytes omitted", body.len())),
        );
    }
    if body.trim().is_empty() {
        return (None, None);
    }
    let value = serde_json::from_str(body)
        .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));
    (Some(value), None)
}

/// Single request against `{base_url}{test_endpoint}`; any 2xx proves the key.
pub(super) async fn validate(
    client: &ApiClient,
    config: &ValidationConfig,
    base_url: &str,
    settings: &ProfileSettings,
    auth: &AuthAugmentation,
) -> ValidationResult {
    let url = match auth.request_url(base_url, &settings.test_endpoint) {
        Ok(url) => url,
        Err(e) => return ValidationResult::invalid(e.to_string()),
    };

    let mut headers = auth.headers.clone();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    match client
        .request(settings.test_method.clone(), url, &headers, None)
        .await
    {
        Ok(reply) if reply.is_success() => {
            let (response, message) = bounded_response(&reply.body, config.max_response_bytes);
            ValidationResult {
                valid: true,
                status: Some(reply.status),
                response,
                message,
                ..Default::default()
            }
        }
        Ok(reply) => ValidationResult {
            valid: false,
            status: Some(reply.status),
            error: Some(format!("API returned status {}", reply.status)),
            ..Default::default()
        },
        Err(e) => ValidationResult::invalid(e.to_string()),
    }
}
