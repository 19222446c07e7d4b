use anyhow::Context;

use shelf_app::{build_registry, migrate, Stores};
use shelf_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = settings.environment.as_str(),
        backend = ?settings.database.backend,
        database = %settings.database.name,
        "shelf bootstrap starting"
    );

    let stores = Stores::connect(&settings.database)
        .await
        .context("failed to open storage")?;
    let registry = build_registry(&settings, &stores);
    let ctx = InitCtx::new(&settings);

    registry.init_modules(&ctx).await?;
    migrate(&registry, &stores).await?;
    registry.start_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}
