//! Simple example of guarded routes
//!
//! Run with `RUST_LOG=schema_guard=debug cargo run --example simple_api`, then:
//!
//! ```text
//! curl 'localhost:3000/users?page=2&token=abc'
//! curl localhost:3000/users/7
//! curl -X POST localhost:3000/users -H 'content-type: application/json' \
//!      -d '{"name":"Ada","email":"ada@example.com"}'
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use schema_guard::prelude::*;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

struct User;

impl Model for User {
    fn definition() -> ModelDefinition {
        ModelDefinition::new("user")
            .column("name", Column::new(ColumnType::String(Some(64))).not_null())
            .attribute("email", ColumnType::String(None))
    }
}

fn user(id: i64, name: &str, email: &str) -> Record {
    Record::new(Arc::new(User::definition()))
        .set("id", id)
        .set("name", name)
        .set("email", email)
        .set("password_hash", "$argon2$...")
}

async fn list_users(Validated(data): Validated) -> Locals {
    let page = data.query["page"].as_i64().unwrap_or(1);
    tracing::info!(page, "listing users");

    Locals(ResponseData::list([
        user(1, "Alice", "alice@example.com"),
        user(2, "Bob", "bob@example.com"),
    ]))
}

async fn show_user(Validated(data): Validated) -> Locals {
    let id = data.params["id"].as_i64().unwrap_or_default();
    Locals::from(ResponseData::from(user(id, "Alice", "alice@example.com")))
}

async fn create_user(Validated(data): Validated) -> Locals {
    let name = data.body["name"].as_str().unwrap_or_default();
    let email = data.body["email"].as_str().unwrap_or_default();
    Locals::from(ResponseData::from(user(3, name, email)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("🚀 schema-guard Simple Example\n");

    let app = Router::new()
        .route(
            "/users",
            guard(
                get(list_users),
                SchemaDescriptor::new()
                    .query(Schema::keys([("page", Schema::integer().min(1.0))])),
                SchemaDescriptor::new()
                    .description("all users")
                    .body(SchemaSource::model_list::<User>()),
            )?
            .merge(guard(
                post(create_user),
                SchemaDescriptor::new().body(Schema::keys([
                    ("name", Schema::string().max_length(64).required()),
                    ("email", Schema::string().email().required()),
                ])),
                SchemaDescriptor::new()
                    .status(StatusCode::CREATED)
                    .body(SchemaSource::model::<User>()),
            )?),
        )
        .route(
            "/users/{id}",
            guard(
                get(show_user),
                SchemaDescriptor::new()
                    .params(Schema::keys([("id", Schema::integer().min(1.0).required())])),
                SchemaDescriptor::new().body(SchemaSource::model::<User>()),
            )?,
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    println!("🌐 Listening on http://{}\n", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
