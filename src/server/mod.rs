use crate::cli::{self, AppConfig};
use crate::models::{KeyMap, Profile, SendResult, ValidationResult};
use crate::service::{ProfileService, ServiceError};
use crate::storage::{ProfileStore, StoreError};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router as AxumRouter,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers
pub struct AppState {
    pub service: ProfileService,
    /// Required on every route except /health when set
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(service: ProfileService, api_key: Option<String>) -> Self {
        Self { service, api_key }
    }

    fn store(&self) -> &ProfileStore {
        self.service.store()
    }
}

/// Constant-time string comparison to prevent timing side-channel attacks
fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Auth middleware: checks Bearer token or x-api-key against server.api_key.
/// Skips /health. If api_key is not configured, all requests pass.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let api_key = state.api_key.as_deref().unwrap_or("");
    if api_key.is_empty() {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or_else(|| {
            request
                .headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
        });

    match token {
        Some(t) if constant_time_eq(t, api_key) => next.run(request).await,
        _ => AppError::Unauthorized(
            "Invalid or missing API key. Provide via Authorization: Bearer <key> or x-api-key header."
                .to_string(),
        )
        .into_response(),
    }
}

/// Build the axum router over `state`.
pub fn build_router(state: Arc<AppState>, max_body_size: usize) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/profiles", get(list_profiles).post(create_profile))
        .route(
            "/profiles/{name}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/profiles/{name}/keys", get(get_profile_keys))
        .route("/test-profile", post(test_profile))
        .route("/send-llm-message", post(send_llm_message))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until SIGINT/SIGTERM.
pub async fn start_server(config: AppConfig, profiles_path: PathBuf) -> anyhow::Result<()> {
    let store = Arc::new(ProfileStore::new(profiles_path));
    match store.list() {
        Ok(profiles) => info!(
            "📦 Loaded {} profiles from {}",
            profiles.len(),
            store.path().display()
        ),
        Err(e) => error!("⚠️ Profile store unreadable: {}", e),
    }

    let service = ProfileService::from_config(&config, store);
    let state = Arc::new(AppState::new(service, config.server.api_key.clone()));
    let app = build_router(state, config.server.max_body_size);

    let addr = cli::format_bind_addr(&config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on {}", addr);
    if config.server.api_key.is_some() {
        info!("🔐 API key required on all routes except /health");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => { info!("Received SIGINT, shutting down..."); }
                    _ = sigterm.recv() => { info!("Received SIGTERM, shutting down..."); }
                }
            }
            Err(e) => {
                error!("Failed to register SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received SIGINT, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received SIGINT, shutting down...");
    }
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let profiles = state.store().list()?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "profiles": profiles.len(),
    })))
}

async fn list_profiles(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Profile>>, AppError> {
    Ok(Json(state.store().list()?))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.store().get(&name)?))
}

async fn get_profile_keys(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<KeyMap>, AppError> {
    Ok(Json(state.store().get(&name)?.keys))
}

async fn create_profile(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Profile>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(profile) = payload?;
    let created = state.store().add(profile)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    payload: Result<Json<Profile>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(profile) = payload?;
    Ok(Json(state.store().update(&name, profile)?))
}

async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store().delete(&name)?;
    Ok(Json(serde_json::json!({
        "message": format!("Profile \"{}\" deleted", name)
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestProfileRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    key_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    key_name: Option<String>,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

async fn test_profile(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TestProfileRequest>, JsonRejection>,
) -> Result<Json<ValidationResult>, AppError> {
    let Json(req) = payload?;
    let name = required(&req.name)
        .ok_or_else(|| AppError::BadRequest("Profile name is required".to_string()))?;

    let result = state
        .service
        .validate_profile(name, required(&req.key_name))
        .await?;
    Ok(Json(result))
}

async fn send_llm_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SendResult>, AppError> {
    let Json(req) = payload?;
    let (Some(name), Some(model), Some(message)) = (
        required(&req.name),
        required(&req.model_name),
        required(&req.message),
    ) else {
        return Err(AppError::BadRequest(
            "Profile name, modelName, and message are required".to_string(),
        ));
    };

    let result = state
        .service
        .send_message(name, required(&req.key_name), model, message)
        .await?;
    Ok(Json(result))
}

/// Error type for web handlers
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::AlreadyExists(_)
            | StoreError::MissingName
            | StoreError::NameMismatch { .. } => AppError::BadRequest(err.to_string()),
            StoreError::Io { .. } | StoreError::Parse { .. } => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ProfileNotFound(_) => AppError::NotFound(err.to_string()),
            ServiceError::Store(inner) => inner.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
            _ => AppError::BadRequest(rejection.body_text()),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
