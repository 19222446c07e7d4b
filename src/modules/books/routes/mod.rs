use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};

use shelf_authz::{require_admin, require_auth, JwtKeys};
use shelf_http::{ApiJson, AppError};

use super::{
    models::{BookDeleted, BookResponse, CreateBook, UpdateBook},
    service::BookService,
};


type Service = State<Arc<BookService>>;

/// Reads need any valid token; writes need the admin role.
pub fn router(service: Arc<BookService>, keys: Arc<JwtKeys>) -> Router {
    let admin = Router::new()
        .route("/", post(create_book))
        .route("/{title}", put(update_book).delete(delete_book))
        .route_layer(from_fn(require_admin));

    Router::new()
        .route("/", get(list_books))
        .route("/{title}", get(get_book))
        .merge(admin)
        .route_layer(from_fn_with_state(keys, require_auth))
        .with_state(service)
}

async fn create_book(
    State(service): Service,
    ApiJson(input): ApiJson<CreateBook>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn list_books(State(service): Service) -> Result<Json<Vec<BookResponse>>, AppError> {
    Ok(Json(service.find_all().await?))
}

async fn get_book(
    State(service): Service,
    Path(title): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    Ok(Json(service.get(&title).await?))
}

async fn update_book(
    State(service): Service,
    Path(title): Path<String>,
    ApiJson(input): ApiJson<UpdateBook>,
) -> Result<Json<BookResponse>, AppError> {
    Ok(Json(service.update(&title, input).await?))
}

async fn delete_book(
    State(service): Service,
    Path(title): Path<String>,
) -> Result<Json<BookDeleted>, AppError> {
    Ok(Json(service.delete(&title).await?))
}
