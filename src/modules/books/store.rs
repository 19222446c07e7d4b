use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bson::doc;
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use shelf_db::StoreError;

use super::models::Book;

pub const COLLECTION: &str = "books";

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: &Book) -> Result<(), StoreError>;

    async fn find_by_title(&self, title: &str) -> Result<Option<Book>, StoreError>;

    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    async fn replace(&self, book: &Book) -> Result<bool, StoreError>;

    async fn delete_by_title(&self, title: &str) -> Result<bool, StoreError>;
}

pub struct MongoBookStore {
    collection: Collection<Book>,
}

impl MongoBookStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn insert(&self, book: &Book) -> Result<(), StoreError> {
        self.collection.insert_one(book).await?;
        Ok(())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Book>, StoreError> {
        Ok(self.collection.find_one(doc! { "title": title }).await?)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace(&self, book: &Book) -> Result<bool, StoreError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": book.id }, book)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_title(&self, title: &str) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! { "title": title }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<Vec<Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Book>>, StoreError> {
        self.books
            .read()
            .map_err(|_| StoreError::Backend("book store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Book>>, StoreError> {
        self.books
            .write()
            .map_err(|_| StoreError::Backend("book store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, book: &Book) -> Result<(), StoreError> {
        let mut books = self.write()?;
        if books.iter().any(|b| b.id == book.id) {
            return Err(StoreError::duplicate(COLLECTION, "_id"));
        }
        if books.iter().any(|b| b.title == book.title) {
            return Err(StoreError::duplicate(COLLECTION, "title"));
        }
        books.push(book.clone());
        Ok(())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Book>, StoreError> {
        Ok(self.read()?.iter().find(|b| b.title == title).cloned())
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.read()?.clone())
    }

    async fn replace(&self, book: &Book) -> Result<bool, StoreError> {
        let mut books = self.write()?;
        match books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_title(&self, title: &str) -> Result<bool, StoreError> {
        let mut books = self.write()?;
        let before = books.len();
        books.retain(|b| b.title != title);
        Ok(books.len() != before)
    }
}
