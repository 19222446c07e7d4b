use bson::{oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Stored book document (`books` collection). `title` is the lookup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "calendar_date")]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.to_hex(),
            title: book.title,
            authors: book.authors,
            publisher: book.publisher,
            published_date: book.published_date,
            categories: book.categories,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "calendar_date")]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Body of `PUT /{title}`. The title itself cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    pub authors: Option<Vec<String>>,
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "calendar_date")]
    pub published_date: Option<NaiveDate>,
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDeleted {
    pub book_deleted: bool,
    pub message: String,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
fn calendar_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn published_date_accepts_plain_and_timestamp_forms() {
        let plain: CreateBook =
            serde_json::from_value(json!({ "title": "Clean Code", "publishedDate": "2008-08-01" }))
                .unwrap();
        let stamped: CreateBook = serde_json::from_value(
            json!({ "title": "Clean Code", "publishedDate": "2008-08-01T00:00:00.000Z" }),
        )
        .unwrap();

        let expected = NaiveDate::from_ymd_opt(2008, 8, 1);
        assert_eq!(plain.published_date, expected);
        assert_eq!(stamped.published_date, expected);
    }

    #[test]
    fn malformed_date_is_rejected() {
        let result = serde_json::from_value::<CreateBook>(
            json!({ "title": "Clean Code", "publishedDate": "August 2008" }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn response_uses_camel_case_and_hex_id() {
        let now = Utc::now();
        let book = Book {
            id: ObjectId::new(),
            title: "Clean Code".to_string(),
            authors: vec!["Robert C. Martin".to_string()],
            publisher: Some("Prentice Hall".to_string()),
            published_date: NaiveDate::from_ymd_opt(2008, 8, 1),
            categories: vec!["Software".to_string()],
            created_at: now,
            updated_at: now,
        };
        let hex = book.id.to_hex();

        let value = serde_json::to_value(BookResponse::from(book)).unwrap();
        assert_eq!(value["id"], hex);
        assert_eq!(value["publishedDate"], "2008-08-01");
    }
}
