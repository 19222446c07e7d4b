//! Domain errors raised by the module services.

use serde_json::{json, Value};
use thiserror::Error;

use shelf_authz::{PasswordError, TokenError};
use shelf_db::StoreError;
use shelf_http::AppError;

use crate::modules::{
    books::service::BOOK_EXISTS,
    users::service::{EMAIL_TAKEN, USERNAME_TAKEN},
};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Invalid { message: String, details: Vec<Value> },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl ServiceError {
    /// Single-field validation failure.
    pub fn invalid_field(field: &str, error: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Invalid {
            message: message.into(),
            details: vec![json!({ "field": field, "error": error.into() })],
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // The unique indexes catch what the pre-checks missed under a race.
            StoreError::Duplicate { collection, field } => {
                ServiceError::AlreadyExists(duplicate_message(&collection, &field).to_string())
            }
            StoreError::InvalidId(raw) => {
                ServiceError::invalid_field("id", format!("'{raw}' is not a valid id"), "Invalid id")
            }
            other => ServiceError::Store(other),
        }
    }
}

/// Same wording the service pre-checks use for each unique field.
fn duplicate_message(collection: &str, field: &str) -> &'static str {
    match (collection, field) {
        ("users", "email") => EMAIL_TAKEN,
        ("users", "username") => USERNAME_TAKEN,
        ("books", "title") => BOOK_EXISTS,
        _ => "Resource already exists",
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::AlreadyExists(message) => AppError::already_exists(message),
            ServiceError::NotFound(message) => AppError::not_found(message),
            ServiceError::Invalid { message, details } => AppError::validation(details, message),
            ServiceError::InvalidCredentials => AppError::unauthorized("Invalid credentials"),
            ServiceError::Forbidden(message) => AppError::forbidden(message),
            other @ (ServiceError::Store(_)
            | ServiceError::Password(_)
            | ServiceError::Token(_)) => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Collects field errors so a request reports all of them at once.
#[derive(Debug, Default)]
pub struct FieldErrors {
    details: Vec<Value>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "required");
        }
    }

    pub fn add(&mut self, field: &str, error: impl Into<String>) {
        self.details
            .push(json!({ "field": field, "error": error.into() }));
    }

    pub fn into_result(self, message: &str) -> ServiceResult<()> {
        if self.details.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Invalid {
                message: message.to_string(),
                details: self.details,
            })
        }
    }
}
