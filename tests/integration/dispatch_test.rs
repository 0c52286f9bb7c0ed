//! Message dispatch against mock HTTP servers

#[path = "../helpers/fixtures.rs"]
mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use akm::dispatch::send_message;
    use akm::models::{AuthConfig, AuthMethod};
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_send_returns_first_choice() {
        let mut server = Server::new_async().await;
        let chat = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-live")
            .match_body(Matcher::Json(json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "Tell me a joke"}]
            })))
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"Why did the crab..."}},
                               {"message":{"role":"assistant","content":"second"}}]}"#,
            )
            .create_async()
            .await;

        let profile = llm_profile(&server.url(), "sk-live");
        let result = send_message(&test_client(), &profile, None, "gpt-4o", "Tell me a joke").await;

        chat.assert_async().await;
        assert!(result.success);
        assert_eq!(result.response.as_deref(), Some("Why did the crab..."));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_send_error_includes_parsed_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(404)
            .with_body(r#"{"error":{"message":"The model `nope` does not exist"}}"#)
            .create_async()
            .await;

        let profile = llm_profile(&server.url(), "sk");
        let result = send_message(&test_client(), &profile, None, "nope", "hi").await;
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("404"));
        assert!(error.contains("The model `nope` does not exist"));
    }

    #[tokio::test]
    async fn test_send_error_falls_back_to_raw_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(502)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let profile = llm_profile(&server.url(), "sk");
        let result = send_message(&test_client(), &profile, None, "m", "hi").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_send_uses_custom_auth_and_query() {
        let mut server = Server::new_async().await;
        let chat = server
            .mock("POST", Matcher::Regex(r"^/chat/completions".to_string()))
            .match_query(Matcher::UrlEncoded("token".into(), "t-1".into()))
            .match_header("x-token", "Token t-1")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let mut profile = query_key_profile(&server.url(), "token", "t-1");
        profile.auth_method = Some(AuthMethod::Custom);
        if let Some(ref mut config) = profile.auth_config {
            config.header_name = Some("X-Token".into());
            config.header_format = Some("Token {key}".into());
        }
        let result = send_message(&test_client(), &profile, None, "m", "hi").await;

        chat.assert_async().await;
        assert_eq!(result.response.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_send_invalid_custom_config_makes_no_request() {
        let mut server = Server::new_async().await;
        let chat = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let mut profile = llm_profile(&server.url(), "sk");
        profile.auth_method = Some(AuthMethod::Custom);
        profile.auth_config = Some(AuthConfig {
            header_name: Some("X-Token".into()),
            ..Default::default()
        });
        let result = send_message(&test_client(), &profile, None, "m", "hi").await;

        chat.assert_async().await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Invalid auth configuration"));
    }

    #[tokio::test]
    async fn test_send_without_choices_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let profile = llm_profile(&server.url(), "sk");
        let result = send_message(&test_client(), &profile, None, "m", "hi").await;
        assert!(!result.success);
        assert!(result.response.is_none());
    }

    #[tokio::test]
    async fn test_send_deadline() {
        let base_url = silent_server().await;
        let profile = llm_profile(&base_url, "sk");
        let result = send_message(&client_with_deadline(150), &profile, None, "m", "hi").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Request timed out after 150ms"));
    }
}
