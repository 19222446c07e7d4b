use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Handed to every lifecycle hook.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

impl<'a> InitCtx<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

/// One index on one collection. `keys` pairs a field with its direction
/// (`1` ascending, `-1` descending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub collection: &'static str,
    pub keys: &'static [(&'static str, i32)],
    pub unique: bool,
}

impl Migration {
    pub const fn unique(
        id: &'static str,
        collection: &'static str,
        keys: &'static [(&'static str, i32)],
    ) -> Self {
        Self {
            id,
            collection,
            keys,
            unique: true,
        }
    }

    pub const fn index(
        id: &'static str,
        collection: &'static str,
        keys: &'static [(&'static str, i32)],
    ) -> Self {
        Self {
            id,
            collection,
            keys,
            unique: false,
        }
    }
}

/// A resource family served under `/api/{name}`.
///
/// Lifecycle: `init` for every module, then migrations, then `start`; `stop`
/// runs in reverse registration order after the server drains.
#[async_trait]
pub trait Module: Sync + Send {
    /// Path segment and log name; must be unique within a registry.
    fn name(&self) -> &'static str;

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Fully stated router, relative to the module mount point.
    fn routes(&self) -> Router;

    /// OpenAPI fragment with `paths` relative to the mount point and
    /// optional `components.schemas`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        Vec::new()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_uniqueness() {
        let email = Migration::unique("email_unique", "users", &[("email", 1)]);
        let recent = Migration::index("book_recent", "reviews", &[("bookId", 1), ("createdAt", -1)]);

        assert!(email.unique);
        assert!(!recent.unique);
        assert_eq!(recent.keys[1], ("createdAt", -1));
    }
}
