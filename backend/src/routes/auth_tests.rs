//! Router tests for the auth surface and the request gate

#[cfg(test)]
mod tests {
    use crate::auth::{JwtService, TokenIdentity};
    use crate::config::AppConfig;
    use crate::routes::test_support::{TestRouter, PASSWORD};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use docvault_shared::Role;
    use proptest::prelude::*;
    use serde_json::json;

    /// Random strings that are not valid access tokens
    fn invalid_token_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("".to_string()),
            "[a-zA-Z0-9]{10,50}",
            "[a-zA-Z0-9]{10}\\.[a-zA-Z0-9]{10}",
            // Three segments, garbage signature
            "[a-zA-Z0-9_-]{20}\\.[a-zA-Z0-9_-]{20}\\.[a-zA-Z0-9_-]{20}",
        ]
    }

    fn auth_header_strategy() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            invalid_token_strategy().prop_map(Some),
            invalid_token_strategy().prop_map(|t| Some(format!("Basic {}", t))),
            invalid_token_strategy().prop_map(|t| Some(format!("Bearer {}", t))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every malformed Authorization header is rejected by the gate with
        /// the error envelope
        #[test]
        fn prop_gate_rejects_invalid_headers(
            auth_header in auth_header_strategy(),
            path in prop_oneof![Just("/api/v1/auth/me"), Just("/api/v1/documents")],
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let harness = TestRouter::new();

                let mut builder = Request::builder().uri(path).method("GET");
                if let Some(header) = auth_header {
                    builder = builder.header("Authorization", header);
                }

                let (status, body) = harness.send(builder.body(Body::empty()).unwrap()).await;
                prop_assert_eq!(status, StatusCode::UNAUTHORIZED);
                prop_assert_eq!(&body["success"], &json!(false));
                prop_assert!(body["error"].is_string());
                Ok(())
            })?;
        }
    }

    #[tokio::test]
    async fn test_missing_header_message() {
        let harness = TestRouter::new();
        let (status, body) = harness.json("GET", "/api/v1/auth/me", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header is missing or malformed");
    }

    #[tokio::test]
    async fn test_login_then_me() {
        let harness = TestRouter::new();
        let user = harness.seed_user("ada@x.com", Role::User);

        let (access, _) = harness.login("ada@x.com").await;
        let (status, body) = harness.json("GET", "/api/v1/auth/me", Some(&access), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], user.id.to_string());
        assert_eq!(body["data"]["role"], "user");
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let harness = TestRouter::new();
        harness.seed_user("ada@x.com", Role::User);

        let unknown = harness
            .json(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "nobody@x.com", "password": PASSWORD})),
            )
            .await;
        let wrong = harness
            .json(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "ada@x.com", "password": "not-the-password"})),
            )
            .await;

        assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn test_token_signed_with_another_secret_is_invalid() {
        let harness = TestRouter::new();
        let user = harness.seed_user("ada@x.com", Role::User);

        let forged = JwtService::new("some-other-secret", None)
            .issue_access_token(&TokenIdentity {
                user_id: user.id,
                email: user.email.clone(),
            })
            .unwrap();

        let (status, body) = harness.json("GET", "/api/v1/auth/me", Some(&forged), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_open_the_gate() {
        let harness = TestRouter::new();
        harness.seed_user("ada@x.com", Role::User);
        let (_, refresh) = harness.login("ada@x.com").await;

        let (status, body) = harness.json("GET", "/api/v1/auth/me", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_register_returns_201_then_rejects_duplicate() {
        let harness = TestRouter::new();
        let payload = json!({"fullname": "Ada", "email": "ada@x.com", "password": "longenough1"});

        let (status, body) = harness
            .json("POST", "/api/v1/auth/register", None, Some(payload.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["email"], "ada@x.com");
        assert!(body["data"].get("role").is_none());

        let (status, body) = harness
            .json("POST", "/api/v1/auth/register", None, Some(payload))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Email is already taken");
    }

    #[tokio::test]
    async fn test_register_validation_message() {
        let harness = TestRouter::new();
        let (status, body) = harness
            .json(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({"fullname": "Ada", "email": "ada@x.com", "password": "short"})),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Validation failed: password: Password must be at least 8 characters long"
        );
        assert!(harness.users.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let harness = TestRouter::new();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from("{\"email\": "))
            .unwrap();

        let (status, body) = harness.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON format in request body");
    }

    #[tokio::test]
    async fn test_refresh_rotation_over_http() {
        let harness = TestRouter::new();
        harness.seed_user("ada@x.com", Role::User);
        let (_, refresh) = harness.login("ada@x.com").await;

        let (status, body) = harness
            .json(
                "POST",
                "/api/v1/auth/refresh-token",
                None,
                Some(json!({"refresh_token": refresh})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let rotated = body["data"]["refresh_token"].as_str().unwrap().to_string();
        assert_ne!(rotated, refresh);

        let (status, body) = harness
            .json(
                "POST",
                "/api/v1/auth/refresh-token",
                None,
                Some(json!({"refresh_token": refresh})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Refresh token has been invalidated");

        let (status, _) = harness
            .json(
                "POST",
                "/api/v1/auth/refresh-token",
                None,
                Some(json!({"refresh_token": rotated})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_closes_the_gate() {
        let harness = TestRouter::new();
        harness.seed_user("ada@x.com", Role::User);
        let (access, refresh) = harness.login("ada@x.com").await;

        let (status, body) = harness
            .json(
                "POST",
                "/api/v1/auth/logout",
                Some(&access),
                Some(json!({"refresh_token": refresh})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Logged out successfully");
        assert_eq!(harness.revoked.len(), 2);

        let (status, body) = harness.json("GET", "/api/v1/auth/me", Some(&access), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Access token has been invalidated");
    }

    #[tokio::test]
    async fn test_gate_without_revocation_check_admits_revoked_token() {
        let mut config = AppConfig::default();
        config.auth.gate_checks_revocation = false;
        let harness = TestRouter::with_config(config);
        harness.seed_user("ada@x.com", Role::User);
        let (access, _) = harness.login("ada@x.com").await;

        harness.state.ledger().revoke(&access, None).await.unwrap();

        let (status, _) = harness.json("GET", "/api/v1/auth/me", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gate_fails_closed_when_ledger_is_down() {
        let harness = TestRouter::new();
        harness.seed_user("ada@x.com", Role::User);
        let (access, _) = harness.login("ada@x.com").await;

        harness.revoked.set_failing(true);
        let (status, body) = harness.json("GET", "/api/v1/auth/me", Some(&access), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Failed to verify token status");
    }

    #[tokio::test]
    async fn test_deleted_user_token_is_rejected() {
        let harness = TestRouter::new();
        harness.seed_user("ada@x.com", Role::User);
        let (access, _) = harness.login("ada@x.com").await;

        harness.users.set_blind_lookups(true);
        let (status, body) = harness.json("GET", "/api/v1/auth/me", Some(&access), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "User not found");
    }

    #[tokio::test]
    async fn test_unknown_route_envelope() {
        let harness = TestRouter::new();
        let (status, body) = harness.json("GET", "/api/v1/nothing-here", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Route GET /api/v1/nothing-here not found");
    }
}
