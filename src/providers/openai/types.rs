use serde::{Deserialize, Serialize};

/// OpenAI Chat Completions request format
#[derive(Debug, Serialize)]
pub(crate) struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OpenAIMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI Chat Completions response format, reduced to what dispatch reads
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIResponse {
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIChoice {
    pub message: OpenAIMessage,
}

/// `GET /models` listing
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIModelList {
    #[serde(default)]
    pub data: Option<Vec<OpenAIModel>>,
}

/// Entries without a string `id` are skipped, not fatal
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIModel {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// Error envelope: `{"error": {"message": ...}}`, `{"error": "..."}` or `{"message": ...}`
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIErrorBody {
    #[serde(default)]
    pub error: Option<OpenAIErrorField>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OpenAIErrorField {
    Detail(OpenAIErrorDetail),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}
