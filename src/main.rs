use anyhow::Context;
use catalog_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        data_dir = %settings.storage.data_dir.display(),
        "catalog-app bootstrap starting"
    );

    catalog_app::run(&settings).await?;

    tracing::info!("catalog-app shut down");
    Ok(())
}
