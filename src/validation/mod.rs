//! Credential liveness checks against a profile's remote API.
//!
//! Two protocols exist. LLM-shaped APIs get a diagnostic `/models` listing
//! followed by a decisive one-token chat completion; anything else gets a
//! single request against its test endpoint. Failures of any kind come back
//! as a `ValidationResult` with `valid: false`, never as an error.

mod generic;
mod llm;

use crate::cli::ValidationConfig;
use crate::models::{Profile, ValidationResult};
use crate::providers::{resolve_key, ApiClient, ProfileSettings, Protocol, ProviderError};

/// Check whether the secret selected by `key_name` works against the profile's API.
pub async fn validate(
    client: &ApiClient,
    config: &ValidationConfig,
    profile: &Profile,
    key_name: Option<&str>,
) -> ValidationResult {
    let Some(base_url) = profile.base_url() else {
        return ValidationResult::invalid(ProviderError::MissingBaseUrl.to_string());
    };

    let secret = match resolve_key(profile, key_name) {
        Ok(secret) => secret,
        Err(e) => return ValidationResult::invalid(e.to_string()),
    };

    let settings = match ProfileSettings::resolve(profile) {
        Ok(settings) => settings,
        Err(e) => return ValidationResult::invalid(e.to_string()),
    };
    let auth = settings.augmentation(&secret, &profile.keys);

    tracing::info!(
        "Validating profile '{}' ({:?} protocol) against {}",
        profile.name,
        settings.protocol,
        base_url
    );

    let result = match settings.protocol {
        Protocol::Llm => llm::validate(client, config, base_url, &auth).await,
        Protocol::Generic => generic::validate(client, config, base_url, &settings, &auth).await,
    };
    log_validation_result(&profile.name, &result);
    result
}

/// Log a validation outcome (server and CLI paths).
pub fn log_validation_result(name: &str, result: &ValidationResult) {
    if result.valid {
        tracing::info!(
            "✅ Profile '{}' valid (status {:?}, {} models)",
            name,
            result.status,
            result.models.len()
        );
    } else {
        tracing::warn!(
            "❌ Profile '{}' invalid (status {:?}): {}",
            name,
            result.status,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(ref models_error) = result.models_error {
        tracing::debug!("  model discovery for '{}': {}", name, models_error);
    }
}
