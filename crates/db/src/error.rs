use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// Errors surfaced by the store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("duplicate key {collection}.{field}")]
    Duplicate { collection: String, field: String },

    /// An id that is not a valid object id was supplied.
    #[error("invalid id '{0}'")]
    InvalidId(String),

    /// Connectivity, serialization and other backend failures.
    #[error("store backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn duplicate(collection: &str, field: &str) -> Self {
        StoreError::Duplicate {
            collection: collection.to_string(),
            field: field.to_string(),
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match duplicate_key_message(&err) {
            Some(message) => {
                let (collection, field) = parse_duplicate(message);
                StoreError::Duplicate { collection, field }
            }
            None => StoreError::Backend(err.to_string()),
        }
    }
}

fn duplicate_key_message(err: &mongodb::error::Error) -> Option<&str> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY =>
        {
            Some(&write_error.message)
        }
        ErrorKind::Command(command_error) if command_error.code == DUPLICATE_KEY => {
            Some(&command_error.message)
        }
        _ => None,
    }
}

/// Pull the collection and first key field out of a server message such as
/// `E11000 duplicate key error collection: shelf.users index: users_email_unique dup key: { email: "a@b.c" }`.
fn parse_duplicate(message: &str) -> (String, String) {
    let collection = message
        .split_once("collection: ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(|ns| ns.rsplit('.').next().unwrap_or(ns))
        .unwrap_or("unknown");

    let field = message
        .split_once("dup key: {")
        .and_then(|(_, rest)| rest.split(':').next())
        .map(|field| field.trim().trim_matches('"'))
        .filter(|field| !field.is_empty())
        .unwrap_or("unknown");

    (collection.to_string(), field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_names_collection_and_field() {
        let message = r#"E11000 duplicate key error collection: shelf.users index: users_email_unique dup key: { email: "ann@test.com" }"#;
        assert_eq!(
            parse_duplicate(message),
            ("users".to_string(), "email".to_string())
        );
    }

    #[test]
    fn unrecognised_duplicate_message_falls_back() {
        assert_eq!(
            parse_duplicate("E11000 duplicate key error"),
            ("unknown".to_string(), "unknown".to_string())
        );
    }
}
