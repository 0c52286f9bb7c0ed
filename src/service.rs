//! The two core operations, keyed by profile name.

use crate::cli::{AppConfig, ValidationConfig};
use crate::models::{SendResult, ValidationResult};
use crate::providers::ApiClient;
use crate::storage::{ProfileStore, StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Lookup failures, kept apart from validation and transport failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Profile with name \"{0}\" not found")]
    ProfileNotFound(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(name) => ServiceError::ProfileNotFound(name),
            other => ServiceError::Store(other),
        }
    }
}

/// Profile store plus the HTTP client used against profile APIs.
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: Arc<ProfileStore>,
    client: ApiClient,
    validation: ValidationConfig,
}

impl ProfileService {
    pub fn new(store: Arc<ProfileStore>, client: ApiClient, validation: ValidationConfig) -> Self {
        Self {
            store,
            client,
            validation,
        }
    }

    /// Service over the configured profile store with the configured deadlines.
    pub fn from_config(config: &AppConfig, store: Arc<ProfileStore>) -> Self {
        Self::new(
            store,
            ApiClient::new(&config.timeouts),
            config.validation.clone(),
        )
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub async fn validate_profile(
        &self,
        name: &str,
        key_name: Option<&str>,
    ) -> Result<ValidationResult, ServiceError> {
        let profile = self.store.get(name)?;
        Ok(crate::validation::validate(&self.client, &self.validation, &profile, key_name).await)
    }

    pub async fn send_message(
        &self,
        name: &str,
        key_name: Option<&str>,
        model: &str,
        message: &str,
    ) -> Result<SendResult, ServiceError> {
        let profile = self.store.get(name)?;
        Ok(crate::dispatch::send_message(&self.client, &profile, key_name, model, message).await)
    }
}
