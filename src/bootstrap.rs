//! Wiring shared by the server binary and the operator CLI.

use std::sync::Arc;

use mongodb::Database;

use shelf_authz::{JwtKeys, PasswordHasher};
use shelf_kernel::{
    settings::{DatabaseSettings, Settings, StorageBackend},
    ModuleRegistry,
};

use crate::modules::{
    self,
    books::store::{BookStore, MemoryBookStore, MongoBookStore},
    reviews::store::{MemoryReviewStore, MongoReviewStore, ReviewStore},
    users::store::{MemoryUserStore, MongoUserStore, UserStore},
};

/// Store adapters for every module, all backed by the same database.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub reviews: Arc<dyn ReviewStore>,
    /// Set only for the Mongo backend; migrations need it.
    pub database: Option<Database>,
}

impl Stores {
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        match settings.backend {
            StorageBackend::Mongo => {
                let database = shelf_db::connect(settings).await?;
                Ok(Self::mongo(database))
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory stores; data is lost on shutdown");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn mongo(database: Database) -> Self {
        Self {
            users: Arc::new(MongoUserStore::new(&database)),
            books: Arc::new(MongoBookStore::new(&database)),
            reviews: Arc::new(MongoReviewStore::new(&database)),
            database: Some(database),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            books: Arc::new(MemoryBookStore::new()),
            reviews: Arc::new(MemoryReviewStore::new()),
            database: None,
        }
    }
}

/// Build the registry with every module wired to `stores`.
pub fn build_registry(settings: &Settings, stores: &Stores) -> ModuleRegistry {
    let keys = Arc::new(JwtKeys::from_settings(&settings.auth));
    let hasher = PasswordHasher::new(settings.auth.bcrypt_cost);

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, stores, keys, hasher);
    registry
}

/// Create the indexes every module declares. No-op for the memory backend.
pub async fn migrate(registry: &ModuleRegistry, stores: &Stores) -> anyhow::Result<()> {
    let Some(database) = &stores.database else {
        tracing::info!("memory backend selected, skipping index migrations");
        return Ok(());
    };
    shelf_db::apply_migrations(database, &registry.collect_migrations()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::send;
    use axum::http::StatusCode;
    use serde_json::json;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.bcrypt_cost = 4;
        settings
    }

    #[test]
    fn registry_mounts_users_books_and_reviews() {
        let registry = build_registry(&settings(), &Stores::in_memory());

        let names: Vec<_> = registry.modules().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["users", "books", "reviews"]);
    }

    #[test]
    fn every_declared_index_is_collected() {
        let registry = build_registry(&settings(), &Stores::in_memory());

        let ids: Vec<_> = registry
            .collect_migrations()
            .into_iter()
            .map(|(module, m)| format!("{module}.{}", m.id))
            .collect();
        assert_eq!(
            ids,
            vec![
                "books.title_unique",
                "reviews.book_recent",
                "users.email_unique",
                "users.username_unique",
            ]
        );
    }

    #[tokio::test]
    async fn migrate_is_a_no_op_without_a_database() {
        let stores = Stores::in_memory();
        let registry = build_registry(&settings(), &stores);

        migrate(&registry, &stores).await.unwrap();
    }

    /// Register, log in, then use the token against the other modules.
    #[tokio::test]
    async fn token_from_login_opens_books_and_reviews() {
        let settings = settings();
        let stores = Stores::in_memory();
        let app = shelf_http::build_router(&build_registry(&settings, &stores), &settings);

        let (status, _) = send(
            &app,
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "username": "test",
                "email": "test@test.com",
                "password": "password123"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "test@test.com", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/books", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, _) = send(
            &app,
            "POST",
            "/api/books",
            Some(&token),
            Some(json!({ "title": "Clean Code" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            "POST",
            "/api/reviews",
            Some(&token),
            Some(json!({ "bookId": bson::oid::ObjectId::new().to_hex(), "rating": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["rating"], 5);
    }

    #[tokio::test]
    async fn openapi_lists_module_paths() {
        let settings = settings();
        let app = shelf_http::build_router(
            &build_registry(&settings, &Stores::in_memory()),
            &settings,
        );

        let (status, body) = send(&app, "GET", "/docs/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        for path in [
            "/api/users/login",
            "/api/books/{title}",
            "/api/reviews/book/{bookId}",
        ] {
            assert!(body["paths"].get(path).is_some(), "missing {path}");
        }
    }
}
