//! MongoDB connectivity shared by the Shelf modules.

pub mod error;
pub mod migrate;

use anyhow::Context;
use bson::{doc, oid::ObjectId};
use chrono::{DateTime, SubsecRound, Utc};
use mongodb::{Client, Database};

use shelf_kernel::settings::DatabaseSettings;

pub use error::StoreError;
pub use migrate::apply_migrations;

/// Connect to MongoDB and verify the server answers a ping.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(&settings.uri)
        .await
        .context("failed to parse MongoDB connection string")?;

    let database = client.database(&settings.name);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .with_context(|| format!("MongoDB at database '{}' did not answer ping", settings.name))?;

    tracing::info!(target: "shelf-db", database = %settings.name, "connected to MongoDB");
    Ok(database)
}

/// Parse a 24-hex-digit object id coming from a path or body.
pub fn parse_object_id(raw: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

/// Current time at the millisecond precision BSON dates keep, so a
/// response built before the write matches what a later read returns.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
