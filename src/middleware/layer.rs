//! Axum glue: middleware functions, the `Locals` response carrier and `guard`

use super::descriptor::SchemaDescriptor;
use super::request::{RequestData, RequestValidator};
use super::response::ResponseValidator;
use crate::core::error::{GuardResult, RequestError};
use crate::core::options::Section;
use crate::model::ResponseData;
use axum::{
    body::Body,
    extract::{FromRequestParts, Query, RawPathParams, Request, State},
    http::{
        HeaderValue, Uri,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use futures::StreamExt;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Handler output destined for the response validator
///
/// Without a response validator it is emitted as plain JSON with status 200.
#[derive(Debug, Clone)]
pub struct Locals(pub ResponseData);

impl IntoResponse for Locals {
    fn into_response(self) -> Response {
        let plain = self.0.to_plain_data();
        let mut response = axum::Json(plain).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<ResponseData> for Locals {
    fn from(data: ResponseData) -> Self {
        Locals(data)
    }
}

impl From<Value> for Locals {
    fn from(value: Value) -> Self {
        Locals(ResponseData::Value(value))
    }
}

/// Middleware validating query, path parameters and JSON body
///
/// Sanitized sections are stored as a [`RequestData`] extension and the body
/// is rewritten with its sanitized form.
pub async fn validate_request(
    State(validator): State<Arc<RequestValidator>>,
    request: Request,
    next: Next,
) -> Response {
    match prepare(&validator, request).await {
        Ok(request) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

async fn prepare(validator: &RequestValidator, request: Request) -> GuardResult<Request> {
    let (mut parts, body) = request.into_parts();

    let query = parse_query(&parts.uri)?;
    let params = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(raw) => Value::Object(
            raw.iter()
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .collect(),
        ),
        Err(_) => Value::Object(Map::new()),
    };

    let validates_body = validator.declares(Section::Body);
    let (body_value, passthrough) = if validates_body {
        let limit = validator.config().body_limit;
        (read_json(&parts.headers, body, limit).await?, None)
    } else {
        (Value::Null, Some(body))
    };

    let mut data = RequestData {
        query,
        params,
        body: body_value,
    };
    validator.handle(&mut data).await?;

    let body = match passthrough {
        Some(body) => body,
        None => {
            let bytes = serde_json::to_vec(&data.body)?;
            parts
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            parts
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Body::from(bytes)
        }
    };

    parts.extensions.insert(data);
    Ok(Request::from_parts(parts, body))
}

/// Parse the query string; repeated keys collect into arrays
fn parse_query(uri: &Uri) -> Result<Value, RequestError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).map_err(|e| {
        RequestError::InvalidQuery {
            message: e.body_text(),
        }
    })?;

    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(map))
}

async fn read_json(
    headers: &axum::http::HeaderMap,
    body: Body,
    limit: usize,
) -> Result<Value, RequestError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(RequestError::BodyTooLarge { limit });
    }

    // Chunked bodies carry no length, so the cap is enforced while reading
    let mut bytes = Vec::new();
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| RequestError::InvalidBody {
            message: e.to_string(),
        })?;
        if bytes.len() + chunk.len() > limit {
            return Err(RequestError::BodyTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(&bytes).map_err(|e| RequestError::InvalidBody {
        message: e.to_string(),
    })
}

/// Middleware validating what the handler returned through [`Locals`]
///
/// Responses that carry no `Locals` pass through untouched.
pub async fn validate_response(
    State(validator): State<Arc<ResponseValidator>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(Locals(data)) = response.extensions_mut().remove::<Locals>() else {
        return response;
    };

    match validator.handle(data).await {
        Ok(reply) => {
            let mut shaped = reply.into_response();
            for (name, value) in response.headers() {
                if name != CONTENT_TYPE && name != CONTENT_LENGTH {
                    shaped.headers_mut().append(name.clone(), value.clone());
                }
            }
            shaped
        }
        Err(err) => err.into_response(),
    }
}

/// Wrap a route with request and response validation
///
/// ```rust,ignore
/// let app = Router::new().route(
///     "/users/{id}",
///     guard(
///         get(show_user),
///         SchemaDescriptor::new().params(Schema::keys([("id", Schema::integer().required())])),
///         SchemaDescriptor::new().body(SchemaSource::model::<User>()),
///     )?,
/// );
/// ```
pub fn guard<S>(
    route: MethodRouter<S>,
    request: SchemaDescriptor,
    response: SchemaDescriptor,
) -> GuardResult<MethodRouter<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let request = Arc::new(RequestValidator::new(request)?);
    let response = Arc::new(ResponseValidator::new(response)?);
    Ok(guard_with(route, request, response))
}

/// Same as [`guard`], with prebuilt validators
pub fn guard_with<S>(
    route: MethodRouter<S>,
    request: Arc<RequestValidator>,
    response: Arc<ResponseValidator>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route
        .layer(from_fn_with_state(response, validate_response))
        .layer(from_fn_with_state(request, validate_request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_repeated_keys_become_arrays() {
        let uri: Uri = "/items?tag=a&tag=b&tag=c&page=1".parse().unwrap();
        assert_eq!(
            parse_query(&uri).unwrap(),
            json!({ "tag": ["a", "b", "c"], "page": "1" })
        );
    }

    #[test]
    fn test_missing_query_is_empty_object() {
        let uri: Uri = "/items".parse().unwrap();
        assert_eq!(parse_query(&uri).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_empty_body_reads_as_object() {
        let headers = axum::http::HeaderMap::new();
        let value = read_json(&headers, Body::empty(), 1024).await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_is_rejected() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(4096usize));
        let err = read_json(&headers, Body::from("{}"), 1024).await.unwrap_err();
        assert!(matches!(err, RequestError::BodyTooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_undeclared_length_over_limit_is_rejected() {
        let headers = axum::http::HeaderMap::new();
        let err = read_json(&headers, Body::from("x".repeat(2048)), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::BodyTooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit_is_payload_too_large() {
        let chunks = futures::stream::iter(vec![
            Ok::<_, std::io::Error>("a".repeat(600)),
            Ok("b".repeat(600)),
        ]);
        let headers = axum::http::HeaderMap::new();

        let err = read_json(&headers, Body::from_stream(chunks), 1024)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.error_code(), "BODY_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_chunked_body_within_limit_is_parsed() {
        let chunks = futures::stream::iter(vec![
            Ok::<_, std::io::Error>("{\"name\":"),
            Ok("\"ada\"}"),
        ]);
        let headers = axum::http::HeaderMap::new();

        let value = read_json(&headers, Body::from_stream(chunks), 1024).await.unwrap();
        assert_eq!(value, json!({ "name": "ada" }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_body() {
        let headers = axum::http::HeaderMap::new();
        let err = read_json(&headers, Body::from("{nope"), 1024).await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidBody { .. }));
    }

    #[tokio::test]
    async fn test_guarded_route_rejects_before_handler() {
        use crate::core::schema::Schema;
        use axum::{Router, http::StatusCode, routing::get};
        use tower::ServiceExt;

        let app: Router = Router::new().route(
            "/items/{id}",
            guard(
                get(|| async { Locals::from(json!({ "reached": true })) }),
                SchemaDescriptor::new().params(Schema::keys([("id", Schema::integer())])),
                SchemaDescriptor::new(),
            )
            .unwrap(),
        );

        let ok = app
            .clone()
            .oneshot(axum::http::Request::builder().uri("/items/3").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let rejected = app
            .oneshot(axum::http::Request::builder().uri("/items/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_locals_emit_plain_json() {
        let response = Locals::from(json!({ "ok": true })).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert!(response.extensions().get::<Locals>().is_some());
    }
}
