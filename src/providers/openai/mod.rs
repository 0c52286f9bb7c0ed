//! OpenAI-compatible wire format shared by validation and message dispatch.

pub(crate) mod types;

use types::*;

pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
pub const MODELS_PATH: &str = "/models";

/// Chat completion body with a single user message.
pub(crate) fn chat_request(model: &str, content: &str, max_tokens: Option<u32>) -> OpenAIRequest {
    OpenAIRequest {
        model: model.to_string(),
        messages: vec![OpenAIMessage {
            role: "user".to_string(),
            content: Some(content.to_string()),
        }],
        max_tokens,
    }
}

/// Model ids from a `/models` body, in listing order. A body without `data` lists nothing.
pub fn parse_model_ids(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let list: OpenAIModelList = serde_json::from_str(body)?;
    Ok(list
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|m| match m.id {
            Some(serde_json::Value::String(id)) => Some(id),
            _ => None,
        })
        .collect())
}

/// Human-readable message from an error body, if the body has one.
pub fn parse_error_message(body: &str) -> Option<String> {
    let parsed: OpenAIErrorBody = serde_json::from_str(body).ok()?;
    let from_error = match parsed.error {
        Some(OpenAIErrorField::Detail(detail)) => detail.message,
        Some(OpenAIErrorField::Text(text)) => Some(text),
        None => None,
    };
    from_error
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
}

/// Text of the first completion choice.
pub fn first_choice_text(body: &str) -> Result<Option<String>, serde_json::Error> {
    let response: OpenAIResponse = serde_json::from_str(body)?;
    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content))
}
