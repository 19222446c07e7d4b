use std::sync::Arc;

use bson::oid::ObjectId;

use crate::error::{FieldErrors, ServiceError, ServiceResult};

use super::{
    models::{Book, BookDeleted, BookResponse, CreateBook, UpdateBook},
    store::BookStore,
};

pub(crate) const BOOK_EXISTS: &str = "Book already exists";

fn not_found(title: &str) -> ServiceError {
    ServiceError::NotFound(format!("Book with title {title} not found"))
}

pub struct BookService {
    store: Arc<dyn BookStore>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: CreateBook) -> ServiceResult<BookResponse> {
        let mut errors = FieldErrors::new();
        errors.require("title", &input.title);
        errors.into_result("Invalid book")?;

        let title = input.title.trim().to_string();
        if self.store.find_by_title(&title).await?.is_some() {
            return Err(ServiceError::AlreadyExists(BOOK_EXISTS.to_string()));
        }

        let now = shelf_db::now();
        let book = Book {
            id: ObjectId::new(),
            title,
            authors: input.authors,
            publisher: input.publisher,
            published_date: input.published_date,
            categories: input.categories,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&book).await?;

        tracing::info!(title = %book.title, "book created");
        Ok(book.into())
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<BookResponse>> {
        let books = self.store.list().await?;
        Ok(books.into_iter().map(BookResponse::from).collect())
    }

    pub async fn get(&self, title: &str) -> ServiceResult<BookResponse> {
        Ok(self.find(title).await?.into())
    }

    /// Apply the provided fields; absent fields keep their stored value.
    pub async fn update(&self, title: &str, input: UpdateBook) -> ServiceResult<BookResponse> {
        let mut book = self.find(title).await?;

        if let Some(authors) = input.authors {
            book.authors = authors;
        }
        if let Some(publisher) = input.publisher {
            book.publisher = Some(publisher);
        }
        if let Some(date) = input.published_date {
            book.published_date = Some(date);
        }
        if let Some(categories) = input.categories {
            book.categories = categories;
        }
        book.updated_at = shelf_db::now();

        if !self.store.replace(&book).await? {
            return Err(not_found(title));
        }

        tracing::info!(title = %book.title, "book updated");
        Ok(book.into())
    }

    pub async fn delete(&self, title: &str) -> ServiceResult<BookDeleted> {
        if !self.store.delete_by_title(title).await? {
            return Err(not_found(title));
        }

        tracing::info!(%title, "book deleted");
        Ok(BookDeleted {
            book_deleted: true,
            message: format!("Book with title {title} deleted successfully"),
        })
    }

    async fn find(&self, title: &str) -> ServiceResult<Book> {
        self.store
            .find_by_title(title)
            .await?
            .ok_or_else(|| not_found(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::MemoryBookStore;
    use chrono::NaiveDate;

    fn service() -> BookService {
        BookService::new(Arc::new(MemoryBookStore::new()))
    }

    fn clean_code() -> CreateBook {
        CreateBook {
            title: "Clean Code".to_string(),
            authors: vec!["Robert C. Martin".to_string()],
            publisher: Some("Prentice Hall".to_string()),
            published_date: NaiveDate::from_ymd_opt(2008, 8, 1),
            categories: vec!["Programming".to_string()],
        }
    }

    #[tokio::test]
    async fn create_then_get_by_title() {
        let service = service();
        let created = service.create(clean_code()).await.unwrap();

        let found = service.get("Clean Code").await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn duplicate_title_is_rejected() {
        let service = service();
        service.create(clean_code()).await.unwrap();

        let err = service.create(clean_code()).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(m) if m == BOOK_EXISTS));
    }

    #[tokio::test]
    async fn blank_title_is_invalid() {
        let err = service().create(CreateBook::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Invalid { .. }));
    }

    #[tokio::test]
    async fn update_changes_only_provided_fields() {
        let service = service();
        service.create(clean_code()).await.unwrap();

        let updated = service
            .update(
                "Clean Code",
                UpdateBook {
                    publisher: Some("Pearson".to_string()),
                    ..UpdateBook::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.publisher.as_deref(), Some("Pearson"));
        assert_eq!(updated.authors, vec!["Robert C. Martin".to_string()]);
        assert_eq!(updated.published_date, NaiveDate::from_ymd_opt(2008, 8, 1));
    }

    #[tokio::test]
    async fn missing_book_is_not_found_for_every_operation() {
        let service = service();
        let message = "Book with title Missing not found";

        assert!(matches!(service.get("Missing").await, Err(ServiceError::NotFound(m)) if m == message));
        assert!(matches!(
            service.update("Missing", UpdateBook::default()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(service.delete("Missing").await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_reports_title() {
        let service = service();
        service.create(clean_code()).await.unwrap();

        let deleted = service.delete("Clean Code").await.unwrap();
        assert!(deleted.book_deleted);
        assert_eq!(deleted.message, "Book with title Clean Code deleted successfully");
        assert!(service.find_all().await.unwrap().is_empty());
    }
}
