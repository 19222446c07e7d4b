use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Json, Router,
};

use shelf_authz::{require_admin, require_auth, Claims};
use shelf_http::{ApiJson, AppError};

use super::{
    models::{CreateUser, LoginRequest, TokenResponse, UpdateUser, UserResponse},
    service::UserService,
};


type Service = State<Arc<UserService>>;

/// Routes mounted under `/api/users`.
///
/// `register` and `login` are public; `/{email}` reads and updates are open
/// to the owner and admins; everything else is admin only.
pub fn router(service: Arc<UserService>) -> Router {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let admin = Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{email}", delete(delete_user))
        .route_layer(from_fn(require_admin));

    let authenticated = Router::new()
        .route("/{email}", get(get_user).put(update_user))
        .merge(admin)
        .route_layer(from_fn_with_state(service.keys(), require_auth));

    public.merge(authenticated).with_state(service)
}

async fn register(
    State(service): Service,
    ApiJson(input): ApiJson<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = service.register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(service): Service,
    ApiJson(input): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(service.login(input).await?))
}

async fn create_user(
    State(service): Service,
    ApiJson(input): ApiJson<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(State(service): Service) -> Result<Json<Vec<UserResponse>>, AppError> {
    Ok(Json(service.find_all().await?))
}

async fn get_user(
    State(service): Service,
    claims: Claims,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(service.get(&email, &claims).await?))
}

async fn update_user(
    State(service): Service,
    claims: Claims,
    Path(email): Path<String>,
    ApiJson(input): ApiJson<UpdateUser>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(service.update(&email, input, &claims).await?))
}

async fn delete_user(
    State(service): Service,
    Path(email): Path<String>,
) -> Result<StatusCode, AppError> {
    service.delete(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}
