use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};

use shelf_authz::{require_auth, Claims, JwtKeys};
use shelf_http::{ApiJson, AppError};

use super::{
    models::{CreateReview, ReviewDeleted, ReviewResponse, UpdateReview},
    service::ReviewService,
};


type Service = State<Arc<ReviewService>>;

pub fn router(service: Arc<ReviewService>, keys: Arc<JwtKeys>) -> Router {
    Router::new()
        .route("/", post(create_review))
        .route("/book/{book_id}", get(reviews_for_book))
        .route(
            "/{id}",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route_layer(from_fn_with_state(keys, require_auth))
        .with_state(service)
}

async fn reviews_for_book(
    State(service): Service,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    Ok(Json(service.find_by_book(&book_id).await?))
}

async fn create_review(
    State(service): Service,
    claims: Claims,
    ApiJson(input): ApiJson<CreateReview>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let review = service.create(input, &claims).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn get_review(
    State(service): Service,
    Path(id): Path<String>,
) -> Result<Json<ReviewResponse>, AppError> {
    Ok(Json(service.get(&id).await?))
}

async fn update_review(
    State(service): Service,
    claims: Claims,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UpdateReview>,
) -> Result<Json<ReviewResponse>, AppError> {
    Ok(Json(service.update(&id, input, &claims).await?))
}

async fn delete_review(
    State(service): Service,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<ReviewDeleted>, AppError> {
    Ok(Json(service.delete(&id, &claims).await?))
}
