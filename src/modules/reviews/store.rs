use std::{cmp::Reverse, sync::RwLock};

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use shelf_db::StoreError;

use super::models::Review;

pub const COLLECTION: &str = "reviews";

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, review: &Review) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Review>, StoreError>;

    /// Reviews of one book, newest first.
    async fn find_by_book(&self, book_id: ObjectId) -> Result<Vec<Review>, StoreError>;

    async fn replace(&self, review: &Review) -> Result<bool, StoreError>;

    async fn delete_by_id(&self, id: ObjectId) -> Result<bool, StoreError>;
}

pub struct MongoReviewStore {
    collection: Collection<Review>,
}

impl MongoReviewStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl ReviewStore for MongoReviewStore {
    async fn insert(&self, review: &Review) -> Result<(), StoreError> {
        self.collection.insert_one(review).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Review>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_book(&self, book_id: ObjectId) -> Result<Vec<Review>, StoreError> {
        let cursor = self
            .collection
            .find(doc! { "bookId": book_id })
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace(&self, review: &Review) -> Result<bool, StoreError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": review.id }, review)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[derive(Default)]
pub struct MemoryReviewStore {
    reviews: RwLock<Vec<Review>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("review store lock poisoned".to_string())
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn insert(&self, review: &Review) -> Result<(), StoreError> {
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        if reviews.iter().any(|r| r.id == review.id) {
            return Err(StoreError::duplicate(COLLECTION, "_id"));
        }
        reviews.push(review.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Review>, StoreError> {
        let reviews = self.reviews.read().map_err(poisoned)?;
        Ok(reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_book(&self, book_id: ObjectId) -> Result<Vec<Review>, StoreError> {
        let mut found: Vec<Review> = self
            .reviews
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| Reverse((r.created_at, r.id)));
        Ok(found)
    }

    async fn replace(&self, review: &Review) -> Result<bool, StoreError> {
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        match reviews.iter_mut().find(|r| r.id == review.id) {
            Some(slot) => {
                *slot = review.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<bool, StoreError> {
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        let before = reviews.len();
        reviews.retain(|r| r.id != id);
        Ok(reviews.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    fn review(book_id: ObjectId, minutes_ago: i64) -> Review {
        let at = Utc::now() - TimeDelta::minutes(minutes_ago);
        Review {
            id: ObjectId::new(),
            book_id,
            user_id: ObjectId::new(),
            rating: 4,
            title: None,
            content: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn find_by_book_is_newest_first_and_filtered() {
        let store = MemoryReviewStore::new();
        let book = ObjectId::new();
        let old = review(book, 30);
        let new = review(book, 1);
        let elsewhere = review(ObjectId::new(), 0);

        for r in [&old, &new, &elsewhere] {
            store.insert(r).await.unwrap();
        }

        let found = store.find_by_book(book).await.unwrap();
        assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![new.id, old.id]);
    }
}
