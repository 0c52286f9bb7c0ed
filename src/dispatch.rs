//! Sends an arbitrary chat message through a profile, reusing the validation auth path.

use crate::models::{Profile, SendResult};
use crate::providers::openai::{
    chat_request, first_choice_text, parse_error_message, CHAT_COMPLETIONS_PATH,
};
use crate::providers::{resolve_key, ApiClient, ProfileSettings, ProviderError};
use reqwest::Method;

/// POST `{baseUrl}/chat/completions` with one user message and return the first choice's text.
///
/// Every failure, including transport errors, is reported as `success: false`.
pub async fn send_message(
    client: &ApiClient,
    profile: &Profile,
    key_name: Option<&str>,
    model: &str,
    message: &str,
) -> SendResult {
    match try_send(client, profile, key_name, model, message).await {
        Ok(result) => result,
        Err(e) if e.is_precondition() => {
            tracing::debug!("Profile '{}' cannot send: {}", profile.name, e);
            SendResult::failed(e.to_string())
        }
        Err(e) => {
            tracing::warn!("Message to '{}' via '{}' failed: {}", model, profile.name, e);
            SendResult::failed(e.to_string())
        }
    }
}

async fn try_send(
    client: &ApiClient,
    profile: &Profile,
    key_name: Option<&str>,
    model: &str,
    message: &str,
) -> Result<SendResult, ProviderError> {
    let base_url = profile.base_url().ok_or(ProviderError::MissingBaseUrl)?;
    let secret = resolve_key(profile, key_name)?;
    let auth = ProfileSettings::resolve(profile)?.augmentation(&secret, &profile.keys);

    let url = auth.request_url(base_url, CHAT_COMPLETIONS_PATH)?;
    let body = serde_json::to_value(chat_request(model, message, None))?;

    tracing::info!("📤 Sending message to '{}' via profile '{}'", model, profile.name);
    let reply = client
        .request(Method::POST, url, &auth.headers, Some(&body))
        .await?;

    if !reply.is_success() {
        let detail = parse_error_message(&reply.body).unwrap_or_else(|| {
            if reply.body.trim().is_empty() {
                format!("Status {}", reply.status)
            } else {
                reply.body.clone()
            }
        });
        return Ok(SendResult::failed(format!(
            "API request failed with status {}: {}",
            reply.status, detail
        )));
    }

    Ok(match first_choice_text(&reply.body) {
        Ok(Some(text)) => SendResult::ok(text),
        Ok(None) => SendResult::failed("Response contained no completion choices"),
        Err(e) => SendResult::failed(format!("Failed to parse completion response: {}", e)),
    })
}
