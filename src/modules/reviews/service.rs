use std::sync::Arc;

use bson::oid::ObjectId;

use shelf_authz::Claims;
use shelf_db::parse_object_id;

use crate::error::{ServiceError, ServiceResult};

use super::{
    models::{
        CreateReview, Review, ReviewDeleted, ReviewResponse, UpdateReview, MAX_RATING, MIN_RATING,
    },
    store::ReviewStore,
};

const NOT_FOUND: &str = "Review not found";

pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_book(&self, book_id: &str) -> ServiceResult<Vec<ReviewResponse>> {
        let book_id = parse_id("bookId", book_id)?;
        let reviews = self.store.find_by_book(book_id).await?;
        Ok(reviews.into_iter().map(ReviewResponse::from).collect())
    }

    /// The referenced book is not checked for existence.
    pub async fn create(&self, input: CreateReview, author: &Claims) -> ServiceResult<ReviewResponse> {
        let book_id = parse_id("bookId", &input.book_id)?;
        let user_id = parse_id("userId", &author.id)?;
        let rating = input
            .rating
            .ok_or_else(|| ServiceError::invalid_field("rating", "required", "Invalid review"))?;
        check_rating(rating)?;

        let now = shelf_db::now();
        let review = Review {
            id: ObjectId::new(),
            book_id,
            user_id,
            rating,
            title: input.title,
            content: input.content,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&review).await?;

        tracing::info!(review = %review.id, book = %review.book_id, user = %author.email, "review created");
        Ok(review.into())
    }

    pub async fn get(&self, id: &str) -> ServiceResult<ReviewResponse> {
        Ok(self.find(id).await?.into())
    }

    pub async fn update(
        &self,
        id: &str,
        input: UpdateReview,
        actor: &Claims,
    ) -> ServiceResult<ReviewResponse> {
        let mut review = self.find(id).await?;
        ensure_author_or_admin(&review, actor)?;

        if let Some(rating) = input.rating {
            check_rating(rating)?;
            review.rating = rating;
        }
        if input.title.is_some() {
            review.title = input.title;
        }
        if input.content.is_some() {
            review.content = input.content;
        }
        review.updated_at = shelf_db::now();

        if !self.store.replace(&review).await? {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }
        Ok(review.into())
    }

    pub async fn delete(&self, id: &str, actor: &Claims) -> ServiceResult<ReviewDeleted> {
        let review = self.find(id).await?;
        ensure_author_or_admin(&review, actor)?;

        if !self.store.delete_by_id(review.id).await? {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }

        tracing::info!(review = %review.id, by = %actor.email, "review deleted");
        Ok(ReviewDeleted {
            message: "Review deleted".to_string(),
            id: review.id.to_hex(),
        })
    }

    async fn find(&self, id: &str) -> ServiceResult<Review> {
        let id = parse_id("id", id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }
}

fn parse_id(field: &str, raw: &str) -> ServiceResult<ObjectId> {
    parse_object_id(raw.trim()).map_err(|_| {
        ServiceError::invalid_field(field, format!("'{raw}' is not a valid id"), format!("Invalid {field}"))
    })
}

fn check_rating(rating: i32) -> ServiceResult<()> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ServiceError::invalid_field(
            "rating",
            format!("must be between {MIN_RATING} and {MAX_RATING}"),
            "Invalid review",
        ))
    }
}

fn ensure_author_or_admin(review: &Review, actor: &Claims) -> ServiceResult<()> {
    if actor.is_admin() || review.user_id.to_hex() == actor.id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only the author or an admin can modify this review".to_string(),
        ))
    }
}
