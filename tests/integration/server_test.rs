//! Web layer, exercised in-process

#[path = "../helpers/fixtures.rs"]
mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use akm::models::Profile;
    use akm::server::{build_router, AppState};
    use akm::service::ProfileService;
    use akm::storage::ProfileStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use mockito::Server;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        _dir: tempfile::TempDir,
        store: Arc<ProfileStore>,
        router: Router,
    }

    fn test_app(api_key: Option<&str>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ProfileStore::new(dir.path().join("profiles.json")));
        let service = ProfileService::new(store.clone(), test_client(), validation_config());
        let state = Arc::new(AppState::new(service, api_key.map(str::to_string)));
        TestApp {
            _dir: dir,
            store,
            router: build_router(state, 1024 * 1024),
        }
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health_counts_profiles() {
        let app = test_app(None);
        app.store.add(Profile::new("a")).unwrap();
        let (status, body) = call(&app.router, empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "profiles": 1}));
    }

    #[tokio::test]
    async fn test_profile_crud() {
        let app = test_app(None);

        let profile = json!({"name": "openai", "baseUrl": "https://api.test/v1", "keys": {"apiKey": "sk-1"}});
        let (status, body) = call(&app.router, json_request("POST", "/profiles", profile)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "openai");

        let (status, body) = call(&app.router, empty_request("GET", "/profiles")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = call(&app.router, empty_request("GET", "/profiles/openai/keys")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"apiKey": "sk-1"}));

        let updated = json!({"name": "openai", "baseUrl": "https://proxy.test/v1", "keys": {"apiKey": "sk-2"}});
        let (status, body) =
            call(&app.router, json_request("PUT", "/profiles/openai", updated)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["baseUrl"], "https://proxy.test/v1");

        let (status, body) = call(&app.router, empty_request("DELETE", "/profiles/openai")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Profile \"openai\" deleted"}));

        let (status, body) = call(&app.router, empty_request("GET", "/profiles/openai")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Profile with name \"openai\" not found");
    }

    #[tokio::test]
    async fn test_create_rejects_missing_name_and_duplicates() {
        let app = test_app(None);
        let (status, _) = call(
            &app.router,
            json_request("POST", "/profiles", json!({"keys": {"apiKey": "k"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = json!({"name": "dup", "keys": {}});
        let (status, _) = call(&app.router, json_request("POST", "/profiles", body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = call(&app.router, json_request("POST", "/profiles", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Profile with name \"dup\" already exists");
    }

    #[tokio::test]
    async fn test_update_rejects_name_mismatch_and_unknown() {
        let app = test_app(None);
        app.store.add(Profile::new("a")).unwrap();

        let (status, _) = call(
            &app.router,
            json_request("PUT", "/profiles/a", json!({"name": "b", "keys": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app.router,
            json_request("PUT", "/profiles/ghost", json!({"name": "ghost", "keys": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = test_app(None);
        let request = Request::builder()
            .method("POST")
            .uri("/profiles")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = call(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_test_profile_distinguishes_lookup_from_validation() {
        let app = test_app(None);

        let (status, _) = call(&app.router, json_request("POST", "/test-profile", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app.router,
            json_request("POST", "/test-profile", json!({"name": "ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        app.store.add(Profile::new("no-url").with_key("apiKey", "k")).unwrap();
        let (status, body) = call(
            &app.router,
            json_request("POST", "/test-profile", json!({"name": "no-url"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["error"], "Profile baseUrl is missing");
    }

    #[tokio::test]
    async fn test_test_profile_runs_validation() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/models")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"gpt-4"}]}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer second")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let app = test_app(None);
        app.store
            .add(llm_profile(&server.url(), "first").with_key("alt", "second"))
            .unwrap();

        let (status, body) = call(
            &app.router,
            json_request(
                "POST",
                "/test-profile",
                json!({"name": "openai", "keyName": "alt"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["status"], 200);
        assert_eq!(body["models"], json!(["gpt-4"]));
        assert_eq!(body["modelsStatus"], 200);
    }

    #[tokio::test]
    async fn test_send_llm_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"pong"}}]}"#)
            .create_async()
            .await;

        let app = test_app(None);
        app.store.add(llm_profile(&server.url(), "sk")).unwrap();

        let (status, _) = call(
            &app.router,
            json_request("POST", "/send-llm-message", json!({"name": "openai", "message": "ping"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app.router,
            json_request(
                "POST",
                "/send-llm-message",
                json!({"name": "openai", "modelName": "gpt-4", "message": "ping"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "response": "pong"}));

        let (status, _) = call(
            &app.router,
            json_request(
                "POST",
                "/send-llm-message",
                json!({"name": "ghost", "modelName": "gpt-4", "message": "ping"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_key_middleware() {
        let app = test_app(Some("s3cret"));

        let (status, _) = call(&app.router, empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app.router, empty_request("GET", "/profiles")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/profiles")
            .header("authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/profiles")
            .header("x-api-key", "wrong")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&app.router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ProfileStore::new(dir.path().join("profiles.json")));
        let service = ProfileService::new(store, test_client(), validation_config());
        let router = build_router(Arc::new(AppState::new(service, None)), 64);

        let big = json!({"name": "big", "keys": {"apiKey": "x".repeat(1024)}});
        let (status, _) = call(&router, json_request("POST", "/profiles", big)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
