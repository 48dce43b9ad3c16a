//! End-to-end checks of the HTTP transport against a mock JSON server.

use std::sync::Arc;
use std::time::Duration;

use recipebook::api::{ApiClient, RECIPES, USERS};
use recipebook::auth::{AuthUser, SessionAuthenticator};
use recipebook::config::FetchConfig;
use recipebook::error::{AuthError, SubmitError};
use recipebook::fetch::{Outcome, RetryPolicy};
use recipebook::recipes::dto::{Recipe, RecipeDraft};
use recipebook::recipes::services::{create_recipe, delete_recipe};
use recipebook::storage::{FileSessionStorage, MemorySessionStorage};
use recipebook::transport::ReqwestTransport;
use recipebook::users::dto::Role;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base: &str) -> ApiClient {
    let transport = ReqwestTransport::new(&FetchConfig::default()).expect("reqwest client");
    ApiClient::new(
        Url::parse(base).expect("base url"),
        Arc::new(transport),
        RetryPolicy {
            max_retries: 3,
            base: Duration::from_millis(5),
        },
    )
}

fn alice() -> serde_json::Value {
    json!({
        "id": "u1", "name": "Alice", "username": "alice", "password": "s3cret!pw",
        "gender": "female", "role": "admin", "profile_picture": "https://example.com/a.png",
        "description": "", "status": "active",
        "created_at": "2024-01-01", "updated_at": "2024-01-01"
    })
}

fn owner() -> AuthUser {
    AuthUser {
        id: "u1".into(),
        name: "Alice".into(),
        username: "alice".into(),
        role: Role::User,
    }
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn login_survives_restart_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("username", "alice"))
            .and(query_param("password", "s3cret!pw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([alice()])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let session_file = dir.path().join("session.json");

        let first = SessionAuthenticator::init(
            client(&server.uri()),
            Arc::new(FileSessionStorage::new(session_file.clone())),
        )
        .await;
        assert_eq!(first.current_identity(), None);
        let user = first
            .authenticate("alice", "s3cret!pw")
            .await
            .expect("login");
        assert_eq!(user.role, Role::Admin);

        let restarted = SessionAuthenticator::init(
            client(&server.uri()),
            Arc::new(FileSessionStorage::new(session_file)),
        )
        .await;
        assert!(!restarted.is_loading());
        assert_eq!(restarted.current_identity(), Some(user));

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn wrong_credentials_report_unknown_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let auth = SessionAuthenticator::init(
            client(&server.uri()),
            Arc::new(MemorySessionStorage::new()),
        )
        .await;
        let err = auth.authenticate("ghost", "nope").await.unwrap_err();
        assert_eq!(err, AuthError::UserNotFound);
        assert_eq!(auth.current_identity(), None);
    }

    #[tokio::test]
    async fn unreachable_server_reports_connection_failure() {
        // Nothing listens on the discard port.
        let auth = SessionAuthenticator::init(
            client("http://127.0.0.1:9"),
            Arc::new(MemorySessionStorage::new()),
        )
        .await;
        let err = auth.authenticate("alice", "s3cret!pw").await.unwrap_err();
        assert_eq!(err.message(), "Failed to connect to the server");
    }
}

mod subscriptions {
    use super::*;

    #[tokio::test]
    async fn collection_read_settles_with_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([alice()])))
            .mount(&server)
            .await;

        let api = client(&server.uri());
        let subscription = api
            .subscribe::<Vec<serde_json::Value>, serde_json::Value>(USERS)
            .expect("subscribe");
        let state = subscription.settled().await;

        assert_eq!(state.outcome, Some(Outcome::Success));
        assert_eq!(state.data.expect("data")[0]["username"], "alice");
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn error_status_is_a_domain_error_without_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recipes"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "down"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server.uri());
        let subscription = api
            .subscribe::<Vec<Recipe>, serde_json::Value>(RECIPES)
            .expect("subscribe");
        let state = subscription.settled().await;

        assert_eq!(state.outcome, Some(Outcome::DomainError));
        assert_eq!(state.error.expect("error body")["message"], "down");
        assert!(state.data.is_none());
        assert!(!state.failed);
    }

    #[tokio::test]
    async fn unreachable_server_fails_after_retries() {
        let api = client("http://127.0.0.1:9");
        let subscription = api
            .subscribe::<Vec<Recipe>, serde_json::Value>(RECIPES)
            .expect("subscribe");
        let state = subscription.settled().await;

        assert_eq!(state.outcome, Some(Outcome::TransportFailed));
        assert!(state.failed);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }
}

mod writes {
    use super::*;

    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: "Porridge".into(),
            short_description: "Oats".into(),
            cook_time: 10.0,
            products: vec!["oats".into(), "milk".into()],
            picture: "https://example.com/porridge.png".into(),
            long_description: String::new(),
            tags: vec!["breakfast".into()],
        }
    }

    #[tokio::test]
    async fn created_recipe_is_posted_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recipes"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let recipe = create_recipe(&client(&server.uri()), &owner(), draft())
            .await
            .expect("created");

        let requests = server.received_requests().await.expect("recording enabled");
        let body: serde_json::Value =
            serde_json::from_slice(&requests[0].body).expect("json body");
        assert_eq!(body["id"], recipe.id.as_str());
        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["products"], json!(["oats", "milk"]));
    }

    #[tokio::test]
    async fn rejected_delete_reports_posting_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/recipes/r1"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let recipe = Recipe {
            id: "r1".into(),
            user_id: "u1".into(),
            name: "Porridge".into(),
            short_description: String::new(),
            cook_time: 10.0,
            products: vec!["oats".into()],
            picture: "https://example.com/porridge.png".into(),
            long_description: String::new(),
            tags: vec![],
            created_at: "2024-01-01".into(),
            updated_at: "2024-01-01".into(),
        };
        let err = delete_recipe(&client(&server.uri()), &owner(), &recipe)
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::Rejected);
        assert_eq!(err.to_string(), "Error while posting");
    }
}
