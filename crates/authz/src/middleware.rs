//! Route guards.
//!
//! `require_auth` must run before `require_roles`; with axum layering that
//! means it is added as the outer `route_layer`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use shelf_http::AppError;

use crate::{Claims, JwtKeys, Role, TokenError};

const NOT_AUTHORIZED: &str = "Not Authorized";

/// Verify the bearer token and stash its [`Claims`] in the request extensions.
pub async fn require_auth(
    State(keys): State<Arc<JwtKeys>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        tracing::debug!(path = %req.uri().path(), "request without bearer token");
        AppError::unauthorized(NOT_AUTHORIZED)
    })?;

    let claims = keys.verify(token).map_err(|err| match err {
        TokenError::Expired => AppError::unauthorized("Token expired"),
        other => {
            tracing::warn!(error = %other, "rejected bearer token");
            AppError::unauthorized(NOT_AUTHORIZED)
        }
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Let the request through only if the authenticated role is in `allowed`.
pub async fn require_roles(
    allowed: &[Role],
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(claims) = req.extensions().get::<Claims>() else {
        return Err(AppError::unauthorized("Not authenticated"));
    };

    if !allowed.contains(&claims.role) {
        tracing::info!(
            user = %claims.email,
            role = %claims.role,
            path = %req.uri().path(),
            "role not allowed"
        );
        return Err(AppError::forbidden("Forbidden: insufficient permissions"));
    }

    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    require_roles(&[Role::Admin], req, next).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();

    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::StatusCode,
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Router,
    };
    use chrono::{TimeDelta, Utc};
    use tower::ServiceExt;

    fn keys() -> Arc<JwtKeys> {
        Arc::new(JwtKeys::new(b"test-secret", TimeDelta::minutes(30)))
    }

    fn app(keys: Arc<JwtKeys>) -> Router {
        let admin = Router::new()
            .route("/admin", get(|claims: Claims| async move { claims.email }))
            .route_layer(from_fn(require_admin));

        Router::new()
            .route("/me", get(|claims: Claims| async move { claims.email }))
            .merge(admin)
            .route_layer(from_fn_with_state(keys, require_auth))
    }

    async fn call(app: Router, uri: &str, authorization: Option<String>) -> StatusCode {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    async fn error_message(app: Router, uri: &str, authorization: String) -> (StatusCode, String) {
        let req = axum::http::Request::builder()
            .uri(uri)
            .header(AUTHORIZATION, authorization)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, body["error"]["message"].as_str().unwrap_or_default().to_string())
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        assert_eq!(call(app(keys()), "/me", None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let status = call(app(keys()), "/me", Some("Basic abc".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let keys = keys();
        let token = keys.issue("1", "reader@test.com", Role::Reader).unwrap();

        let status = call(app(keys), "/me", Some(format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let keys = keys();
        let now = Utc::now().timestamp();
        let token = keys
            .sign(&Claims {
                id: "1".to_string(),
                email: "late@test.com".to_string(),
                role: Role::Admin,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        let (status, message) = error_message(app(keys), "/me", format!("Bearer {token}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Token expired");
    }

    #[tokio::test]
    async fn foreign_signature_is_not_authorized() {
        let foreign = JwtKeys::new(b"another-secret", TimeDelta::minutes(30));
        let token = foreign.issue("1", "reader@test.com", Role::Reader).unwrap();

        let (status, message) = error_message(app(keys()), "/me", format!("Bearer {token}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Not Authorized");
    }

    #[tokio::test]
    async fn reader_is_forbidden_from_admin_route() {
        let keys = keys();
        let token = keys.issue("1", "reader@test.com", Role::Reader).unwrap();

        let status = call(app(keys), "/admin", Some(format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_passes_role_check() {
        let keys = keys();
        let token = keys.issue("1", "admin@test.com", Role::Admin).unwrap();

        let status = call(app(keys), "/admin", Some(format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn role_check_without_authentication_is_unauthorized() {
        let app = Router::new()
            .route("/admin", get(|| async { "never" }))
            .route_layer(from_fn(require_admin));

        assert_eq!(call(app, "/admin", None).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "Bearer   ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
