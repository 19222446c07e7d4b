use std::sync::RwLock;

use async_trait::async_trait;
use bson::doc;
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use shelf_db::StoreError;

use super::models::User;

pub const COLLECTION: &str = "users";

/// Persistence port for user documents.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Replace the document with the same `_id`. Returns false if none matched.
    async fn replace(&self, user: &User) -> Result<bool, StoreError>;

    async fn delete_by_email(&self, email: &str) -> Result<bool, StoreError>;
}

pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace(&self, user: &User) -> Result<bool, StoreError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": user.id }, user)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! { "email": email }).await?;
        Ok(result.deleted_count > 0)
    }
}

/// In-process store with the same unique constraints as the Mongo indexes.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<User>>, StoreError> {
        self.users
            .read()
            .map_err(|_| StoreError::Backend("user store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<User>>, StoreError> {
        self.users
            .write()
            .map_err(|_| StoreError::Backend("user store lock poisoned".to_string()))
    }
}

fn conflicts(existing: &User, candidate: &User) -> Option<&'static str> {
    if existing.id == candidate.id {
        return None;
    }
    if existing.email == candidate.email {
        Some("email")
    } else if existing.username == candidate.username {
        Some("username")
    } else {
        None
    }
}

fn check_unique(users: &[User], candidate: &User) -> Result<(), StoreError> {
    match users.iter().find_map(|u| conflicts(u, candidate)) {
        Some(field) => Err(StoreError::duplicate(COLLECTION, field)),
        None => Ok(()),
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.write()?;
        if users.iter().any(|u| u.id == user.id) {
            return Err(StoreError::duplicate(COLLECTION, "_id"));
        }
        check_unique(&users, user)?;
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.iter().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.read()?.clone())
    }

    async fn replace(&self, user: &User) -> Result<bool, StoreError> {
        let mut users = self.write()?;
        check_unique(&users, user)?;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let mut users = self.write()?;
        let before = users.len();
        users.retain(|u| u.email != email);
        Ok(users.len() != before)
    }
}
