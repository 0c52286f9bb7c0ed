use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Named secrets of a profile, in insertion order.
pub type KeyMap = IndexMap<String, String>;

/// A stored API profile: where the API lives, which secrets it has, and how to authenticate.
///
/// Field names follow the on-disk JSON format (`baseUrl`, `apiType`, ...).
/// Fields this version does not know about are kept in `extra` so a
/// read-modify-write cycle never drops them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub keys: KeyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<ApiType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<AuthMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_config: Option<AuthConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_method: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(name.into(), value.into());
        self
    }

    /// Base URL with surrounding whitespace and trailing slashes removed, `None` when blank.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }
}

/// Kind of remote API a profile points at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    Llm,
    Rest,
    #[serde(rename = "oauth")]
    OAuth,
    Custom,
    /// Any other value found on disk, kept as written
    #[serde(untagged)]
    Other(String),
}

impl std::str::FromStr for ApiType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "llm" => ApiType::Llm,
            "rest" => ApiType::Rest,
            "oauth" => ApiType::OAuth,
            "custom" => ApiType::Custom,
            _ => ApiType::Other(s.to_string()),
        })
    }
}

/// How the secret is presented to the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Bearer,
    #[serde(rename = "apikey")]
    ApiKey,
    Basic,
    Custom,
    /// Unrecognized method; authenticates like `Bearer`
    #[serde(untagged)]
    Other(String),
}

impl std::str::FromStr for AuthMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "bearer" => AuthMethod::Bearer,
            "apikey" => AuthMethod::ApiKey,
            "basic" => AuthMethod::Basic,
            "custom" => AuthMethod::Custom,
            _ => AuthMethod::Other(s.to_string()),
        })
    }
}

/// Where the secret travels in addition to (or instead of) a header.
///
/// Unrecognized spellings are kept verbatim so one odd record never makes
/// the profile file unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLocation {
    #[default]
    Header,
    Query,
    #[serde(untagged)]
    Other(String),
}

impl KeyLocation {
    /// True for `query` in any case. Anything else behaves as `header`.
    pub fn is_query(&self) -> bool {
        match self {
            KeyLocation::Query => true,
            KeyLocation::Header => false,
            KeyLocation::Other(value) => value.eq_ignore_ascii_case("query"),
        }
    }
}

impl std::str::FromStr for KeyLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "header" => Ok(KeyLocation::Header),
            "query" => Ok(KeyLocation::Query),
            other => Err(format!(
                "invalid key location '{}' (expected header or query)",
                other
            )),
        }
    }
}

/// Extended authentication settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,
    /// Header value template; `{key}` is replaced by the secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<KeyLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_field: Option<String>,
}

impl AuthConfig {
    pub fn is_empty(&self) -> bool {
        *self == AuthConfig::default()
    }
}

/// Outcome of a credential check. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    /// HTTP status of the decisive response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Parsed body of a successful generic check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

impl ValidationResult {
    /// A failed result carrying only an error message.
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Outcome of sending a chat message through a profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SendResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResult {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(response.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.into()),
        }
    }
}
