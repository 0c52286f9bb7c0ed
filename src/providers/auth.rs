//! Credential selection and request authentication for stored profiles.
//!
//! Every default a profile can omit is applied once, in [`ProfileSettings::resolve`],
//! so the validation and dispatch paths only ever see fully populated settings.
//! Profiles that carry nothing but `baseUrl` and `keys` resolve to plain
//! `Authorization: Bearer <key>` against an LLM-shaped API.

use super::error::ProviderError;
use crate::models::{ApiType, AuthMethod, KeyMap, Profile};
use base64::{engine::general_purpose, Engine as _};
use indexmap::IndexMap;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Key consulted when the requested key name is absent
pub const DEFAULT_KEY_NAME: &str = "apiKey";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";
pub const KEY_PLACEHOLDER: &str = "{key}";
/// Endpoint that marks a profile without `apiType` as LLM-shaped
pub const MODELS_ENDPOINT: &str = "/models";
/// Endpoint probed by the generic protocol when the profile names none
pub const GENERIC_TEST_ENDPOINT: &str = "/test";
pub const DEFAULT_TEST_METHOD: &str = "GET";

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Pick the secret used for one validation or dispatch call.
///
/// Order: the requested key, then `apiKey`, then the first key in insertion
/// order. Empty values count as absent.
pub fn resolve_key(profile: &Profile, requested: Option<&str>) -> Result<SecretString, ProviderError> {
    let keys = &profile.keys;
    let value = requested
        .and_then(|name| non_empty(keys.get(name)))
        .or_else(|| non_empty(keys.get(DEFAULT_KEY_NAME)))
        .or_else(|| non_empty(keys.values().next()))
        .ok_or(ProviderError::NoKeyAvailable)?;
    Ok(SecretString::new(value.to_string()))
}

/// Which of the two liveness protocols a profile is checked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// `/models` discovery followed by a one-token chat completion
    Llm,
    /// A single request against the profile's test endpoint
    Generic,
}

/// How the secret is turned into a request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    ApiKey {
        header_name: String,
        format: String,
    },
    Basic {
        username_field: Option<String>,
        password_field: Option<String>,
    },
    Custom {
        header_name: String,
        format: String,
    },
}

impl AuthScheme {
    pub fn from_profile(profile: &Profile) -> Result<Self, ProviderError> {
        let config = profile.auth_config.clone().unwrap_or_default();
        let header_name = non_empty(config.header_name.as_ref()).map(str::to_string);
        let header_format = non_empty(config.header_format.as_ref()).map(str::to_string);

        let scheme = match profile.auth_method.as_ref() {
            None | Some(AuthMethod::Bearer) => AuthScheme::Bearer,
            Some(AuthMethod::ApiKey) => AuthScheme::ApiKey {
                header_name: header_name.unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
                format: header_format.unwrap_or_else(|| KEY_PLACEHOLDER.to_string()),
            },
            Some(AuthMethod::Basic) => AuthScheme::Basic {
                username_field: non_empty(config.username_field.as_ref()).map(str::to_string),
                password_field: non_empty(config.password_field.as_ref()).map(str::to_string),
            },
            Some(AuthMethod::Custom) => {
                let header_name = header_name.ok_or_else(|| {
                    ProviderError::InvalidAuthConfig(
                        "custom auth requires authConfig.headerName".to_string(),
                    )
                })?;
                let format = header_format.ok_or_else(|| {
                    ProviderError::InvalidAuthConfig(
                        "custom auth requires authConfig.headerFormat".to_string(),
                    )
                })?;
                AuthScheme::Custom {
                    header_name,
                    format,
                }
            }
            Some(AuthMethod::Other(method)) => {
                tracing::debug!("Unknown auth method '{}', using bearer", method);
                AuthScheme::Bearer
            }
        };
        Ok(scheme)
    }

    /// Header (name, value) carrying `secret`.
    fn header(&self, secret: &str, keys: &KeyMap) -> (String, String) {
        match self {
            AuthScheme::Bearer => (
                AUTHORIZATION_HEADER.to_string(),
                format!("Bearer {}", secret),
            ),
            AuthScheme::ApiKey {
                header_name,
                format,
            }
            | AuthScheme::Custom {
                header_name,
                format,
            } => (header_name.clone(), format.replace(KEY_PLACEHOLDER, secret)),
            AuthScheme::Basic {
                username_field,
                password_field,
            } => {
                let username = username_field
                    .as_ref()
                    .and_then(|f| keys.get(f))
                    .map(String::as_str)
                    .unwrap_or(secret);
                let password = password_field
                    .as_ref()
                    .and_then(|f| keys.get(f))
                    .map(String::as_str)
                    .unwrap_or("");
                let encoded =
                    general_purpose::STANDARD.encode(format!("{}:{}", username, password));
                (
                    AUTHORIZATION_HEADER.to_string(),
                    format!("Basic {}", encoded),
                )
            }
        }
    }
}

/// Fully defaulted view of a profile, computed before any auth or protocol logic runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSettings {
    pub scheme: AuthScheme,
    /// Query parameter name the secret is also sent under
    pub query_param: Option<String>,
    pub protocol: Protocol,
    /// Path probed by the generic protocol, always starting with `/`
    pub test_endpoint: String,
    pub test_method: Method,
}

impl ProfileSettings {
    pub fn resolve(profile: &Profile) -> Result<Self, ProviderError> {
        let scheme = AuthScheme::from_profile(profile)?;

        let query_param = profile.auth_config.as_ref().and_then(|c| {
            c.location
                .as_ref()
                .filter(|l| l.is_query())
                .and_then(|_| non_empty(c.param_name.as_ref()))
                .map(str::to_string)
        });

        let test_endpoint = non_empty(profile.test_endpoint.as_ref());
        let protocol = match (&profile.api_type, test_endpoint) {
            (Some(ApiType::Llm), _) => Protocol::Llm,
            (None, None) => Protocol::Llm,
            (None, Some(endpoint)) if endpoint == MODELS_ENDPOINT => Protocol::Llm,
            _ => Protocol::Generic,
        };

        let test_endpoint = match test_endpoint.unwrap_or(GENERIC_TEST_ENDPOINT) {
            e if e.starts_with('/') => e.to_string(),
            e => format!("/{}", e),
        };

        // Only the generic protocol sends testMethod
        let test_method = match protocol {
            Protocol::Generic => {
                let method =
                    non_empty(profile.test_method.as_ref()).unwrap_or(DEFAULT_TEST_METHOD);
                Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .map_err(|_| ProviderError::InvalidTestMethod(method.to_string()))?
            }
            Protocol::Llm => Method::GET,
        };

        Ok(Self {
            scheme,
            query_param,
            protocol,
            test_endpoint,
            test_method,
        })
    }

    /// Auth augmentation for `secret` under these settings.
    pub fn augmentation(&self, secret: &SecretString, keys: &KeyMap) -> AuthAugmentation {
        let secret = secret.expose_secret();
        let (name, value) = self.scheme.header(secret, keys);
        let mut headers = IndexMap::new();
        headers.insert(name, value);
        AuthAugmentation {
            headers,
            query_param: self.query_param.as_ref().map(|name| QueryParam {
                name: name.clone(),
                value: secret.to_string(),
            }),
        }
    }
}

/// Secret carried as a URL query parameter.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl std::fmt::Debug for QueryParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryParam")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Headers and optional query parameter that authenticate a request.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthAugmentation {
    pub headers: IndexMap<String, String>,
    pub query_param: Option<QueryParam>,
}

impl std::fmt::Debug for AuthAugmentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthAugmentation")
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("query_param", &self.query_param)
            .finish()
    }
}

impl AuthAugmentation {
    /// `base_url` + `path`, with the auth query parameter appended (percent-encoded).
    pub fn request_url(&self, base_url: &str, path: &str) -> Result<Url, ProviderError> {
        let raw = format!("{}{}", base_url, path);
        let mut url =
            Url::parse(&raw).map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if let Some(param) = &self.query_param {
            // RFC 3986 encoding: a space is %20, never `+`
            let pair = format!(
                "{}={}",
                urlencoding::encode(&param.name),
                urlencoding::encode(&param.value)
            );
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{}&{}", existing, pair),
                _ => pair,
            };
            url.set_query(Some(&query));
        }
        Ok(url)
    }
}

/// Map a profile and a resolved secret to the request augmentation its API expects.
///
/// Pure: no I/O, the profile is only read.
pub fn build_auth(profile: &Profile, secret: &SecretString) -> Result<AuthAugmentation, ProviderError> {
    let settings = ProfileSettings::resolve(profile)?;
    Ok(settings.augmentation(secret, &profile.keys))
}
