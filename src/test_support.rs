//! Helpers shared by the route tests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::TimeDelta;
use serde_json::Value;
use tower::ServiceExt;

use shelf_authz::{JwtKeys, PasswordHasher, Role};

pub fn keys() -> Arc<JwtKeys> {
    Arc::new(JwtKeys::new(b"test-secret", TimeDelta::minutes(30)))
}

/// Lowest bcrypt cost; hashing at the default cost slows tests down.
pub fn hasher() -> PasswordHasher {
    PasswordHasher::new(4)
}

pub fn token(keys: &JwtKeys, id: &str, email: &str, role: Role) -> String {
    keys.issue(id, email, role).unwrap()
}

/// Send one request and decode the JSON body (`Value::Null` when empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}
