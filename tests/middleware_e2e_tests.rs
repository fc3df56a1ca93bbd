//! End-to-end tests of guarded routes through a real axum router

use axum_test::TestServer;
use schema_guard::prelude::*;
use std::sync::Arc;

fn user_model() -> Arc<ModelDefinition> {
    Arc::new(
        ModelDefinition::new("user")
            .attribute("name", ColumnType::String(Some(64)))
            .attribute("email", ColumnType::String(None))
            .without_timestamps(),
    )
}

async fn echo_query(Validated(data): Validated) -> Locals {
    Locals::from(json!({ "query": data.query }))
}

async fn show_user(Validated(data): Validated) -> Locals {
    let id = data.params["id"].clone();
    let record = Record::new(user_model())
        .set("id", id)
        .set("name", "ada")
        .set("password_hash", "x");
    Locals::from(ResponseData::from(record))
}

async fn create_user(Validated(data): Validated) -> impl axum::response::IntoResponse {
    (
        [("x-request-id", "req-1")],
        Locals::from(json!({
            "id": 1,
            "name": data.body["name"],
            "email": data.body["email"],
            "password_hash": "secret",
        })),
    )
}

async fn broken_user() -> Locals {
    Locals::from(json!({ "id": "not-an-id" }))
}

fn create_test_server() -> TestServer {
    let app = Router::new()
        .route(
            "/items",
            guard(
                get(echo_query),
                SchemaDescriptor::new().query(Schema::keys([("num", Schema::number().required())])),
                SchemaDescriptor::new(),
            )
            .expect("Failed to guard /items"),
        )
        .route(
            "/users",
            guard(
                post(create_user),
                SchemaDescriptor::new().body(Schema::keys([
                    ("name", Schema::string().required()),
                    ("email", Schema::string().email().required()),
                ])),
                SchemaDescriptor::new()
                    .status(StatusCode::CREATED)
                    .body(SchemaSource::Model(user_model())),
            )
            .expect("Failed to guard /users"),
        )
        .route(
            "/users/{id}",
            guard(
                get(show_user),
                SchemaDescriptor::new().params(Schema::keys([("id", Schema::integer().required())])),
                SchemaDescriptor::new().body(SchemaSource::Model(user_model())),
            )
            .expect("Failed to guard /users/{id}"),
        )
        .route(
            "/broken",
            guard(
                get(broken_user),
                SchemaDescriptor::new(),
                SchemaDescriptor::new().body(Schema::keys([("id", Schema::integer())])),
            )
            .expect("Failed to guard /broken"),
        );

    TestServer::new(app)
}

// =============================================================================
// Query Tests
// =============================================================================

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_query_is_converted_and_stripped() {
        let server = create_test_server();

        let response = server
            .get("/items")
            .add_query_param("num", "5")
            .add_query_param("extra", "x")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body, json!({ "query": { "num": 5 } }));
    }

    #[tokio::test]
    async fn test_token_reaches_the_handler() {
        let server = create_test_server();

        let response = server
            .get("/items")
            .add_query_param("num", "5")
            .add_query_param("token", "abc")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["query"]["token"], "abc");
    }

    #[tokio::test]
    async fn test_invalid_query_is_rejected() {
        let server = create_test_server();

        let response = server.get("/items").add_query_param("num", "abc").await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["details"]["fields"], json!(["num"]));
    }

    #[tokio::test]
    async fn test_missing_query_is_rejected() {
        let server = create_test_server();

        let response = server.get("/items").await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["message"], "\"num\" is required");
    }
}

// =============================================================================
// Params Tests
// =============================================================================

mod params_tests {
    use super::*;

    #[tokio::test]
    async fn test_params_are_converted() {
        let server = create_test_server();

        let response = server.get("/users/42").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body, json!({ "id": 42, "name": "ada" }));
    }

    #[tokio::test]
    async fn test_invalid_params_are_rejected() {
        let server = create_test_server();

        let response = server.get("/users/abc").await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["details"]["fields"], json!(["id"]));
    }
}

// =============================================================================
// Body Tests
// =============================================================================

mod body_tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_body_and_shaped_response() {
        let server = create_test_server();

        let response = server
            .post("/users")
            .json(&json!({ "name": "Ada", "email": "ada@example.com", "admin": true }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.header("x-request-id"), "req-1");

        let body: Value = response.json();
        assert_eq!(
            body,
            json!({ "id": 1, "name": "Ada", "email": "ada@example.com" })
        );
    }

    #[tokio::test]
    async fn test_every_body_issue_is_reported() {
        let server = create_test_server();

        let response = server.post("/users").json(&json!({ "email": "nope" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["details"]["fields"], json!(["name", "email"]));
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let server = create_test_server();

        let response = server
            .post("/users")
            .bytes("{not json".into())
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_BODY");
    }
}

// =============================================================================
// Response Tests
// =============================================================================

mod response_tests {
    use super::*;

    #[tokio::test]
    async fn test_non_conforming_response_is_sent_unchanged() {
        let server = create_test_server();

        let response = server.get("/broken").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body, json!({ "id": "not-an-id" }));
    }
}
