//! Auth header builder and key resolver behavior

#[cfg(test)]
mod tests {
    use akm::models::{AuthConfig, AuthMethod, Profile};
    use akm::providers::{build_auth, resolve_key, ProviderError};
    use base64::{engine::general_purpose, Engine as _};
    use secrecy::{ExposeSecret, SecretString};

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    #[test]
    fn test_bearer_header_is_exact() {
        for method in [None, Some(AuthMethod::Bearer)] {
            let mut profile = Profile::new("p").with_key("apiKey", "sk-123");
            profile.auth_method = method;
            let aug = build_auth(&profile, &secret("sk-123")).unwrap();
            assert_eq!(aug.headers.len(), 1);
            assert_eq!(aug.headers.get("Authorization").unwrap(), "Bearer sk-123");
            assert!(aug.query_param.is_none());
        }
    }

    #[test]
    fn test_apikey_defaults_to_x_api_key() {
        let mut profile = Profile::new("p");
        profile.auth_method = Some(AuthMethod::ApiKey);
        let aug = build_auth(&profile, &secret("raw-secret")).unwrap();
        assert_eq!(aug.headers.get("X-API-Key").unwrap(), "raw-secret");
        assert_eq!(aug.headers.len(), 1);
    }

    #[test]
    fn test_apikey_custom_format() {
        let mut profile = Profile::new("p");
        profile.auth_method = Some(AuthMethod::ApiKey);
        profile.auth_config = Some(AuthConfig {
            header_name: Some("X-Custom-Auth".into()),
            header_format: Some("token-{key}-suffix".into()),
            ..Default::default()
        });
        let aug = build_auth(&profile, &secret("my-key")).unwrap();
        assert_eq!(
            aug.headers.get("X-Custom-Auth").unwrap(),
            "token-my-key-suffix"
        );
    }

    #[test]
    fn test_basic_uses_named_fields() {
        let mut profile = Profile::new("p")
            .with_key("username", "testuser")
            .with_key("password", "testpass");
        profile.auth_method = Some(AuthMethod::Basic);
        profile.auth_config = Some(AuthConfig {
            username_field: Some("username".into()),
            password_field: Some("password".into()),
            ..Default::default()
        });
        let secret = resolve_key(&profile, None).unwrap();
        let aug = build_auth(&profile, &secret).unwrap();

        let value = aug.headers.get("Authorization").unwrap();
        let encoded = value.strip_prefix("Basic ").unwrap();
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "testuser:testpass");
    }

    #[test]
    fn test_basic_without_fields_uses_secret_and_empty_password() {
        let mut profile = Profile::new("p");
        profile.auth_method = Some(AuthMethod::Basic);
        let aug = build_auth(&profile, &secret("only")).unwrap();
        let encoded = general_purpose::STANDARD.encode("only:");
        assert_eq!(
            aug.headers.get("Authorization").unwrap(),
            &format!("Basic {}", encoded)
        );
    }

    #[test]
    fn test_custom_missing_header_name_fails() {
        let mut profile = Profile::new("p");
        profile.auth_method = Some(AuthMethod::Custom);
        let err = build_auth(&profile, &secret("s")).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidAuthConfig(_)));
    }

    #[test]
    fn test_resolver_uses_insertion_order_fallback() {
        let profile = Profile::new("p")
            .with_key("primary", "p")
            .with_key("secondary", "s");
        let key = resolve_key(&profile, Some("nonexistent")).unwrap();
        assert_eq!(key.expose_secret(), "p");
    }

    #[test]
    fn test_resolver_fails_on_empty_keys() {
        assert!(matches!(
            resolve_key(&Profile::new("p"), Some("x")),
            Err(ProviderError::NoKeyAvailable)
        ));
    }

    #[test]
    fn test_secret_is_recoverable_from_header() {
        let secrets = ["sk-abc", "with spaces", "ünïcødé-🔑", "a{key}b", ""];
        for raw in secrets {
            let profile = Profile::new("p");
            let aug = build_auth(&profile, &secret(raw)).unwrap();
            let value = aug.headers.get("Authorization").unwrap();
            assert_eq!(value.strip_prefix("Bearer ").unwrap(), raw);

            let mut profile = Profile::new("p");
            profile.auth_method = Some(AuthMethod::ApiKey);
            profile.auth_config = Some(AuthConfig {
                header_format: Some("pre-{key}-post".into()),
                ..Default::default()
            });
            let aug = build_auth(&profile, &secret(raw)).unwrap();
            let value = aug.headers.get("X-API-Key").unwrap();
            let recovered = value
                .strip_prefix("pre-")
                .and_then(|v| v.strip_suffix("-post"))
                .unwrap();
            assert_eq!(recovered, raw);
        }
    }
}
