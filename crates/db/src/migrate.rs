//! Applies the index migrations collected from the module registry.

use anyhow::Context;
use bson::Document;
use mongodb::{options::IndexOptions, Database, IndexModel};

use shelf_kernel::Migration;

/// Create every index; existing indexes with the same keys and options are left alone.
pub async fn apply_migrations(
    database: &Database,
    migrations: &[(String, Migration)],
) -> anyhow::Result<()> {
    tracing::info!(target: "shelf-db", count = migrations.len(), "applying index migrations");

    for (module, migration) in migrations {
        let index = index_model(module, migration);
        let name = index_name(module, migration);

        database
            .collection::<Document>(migration.collection)
            .create_index(index)
            .await
            .with_context(|| format!("failed to apply migration '{name}'"))?;

        tracing::info!(
            target: "shelf-db",
            module = %module,
            collection = migration.collection,
            index = %name,
            "index ensured"
        );
    }

    Ok(())
}

/// Index names are namespaced by module so ids can repeat across modules.
pub fn index_name(module: &str, migration: &Migration) -> String {
    format!("{module}_{}", migration.id)
}

pub fn index_model(module: &str, migration: &Migration) -> IndexModel {
    let mut keys = Document::new();
    for (field, direction) in migration.keys {
        keys.insert(*field, *direction);
    }

    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(index_name(module, migration))
                .unique(migration.unique)
                .build(),
        )
        .build()
}
