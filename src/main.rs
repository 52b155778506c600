use blog_admin::{app_router, ensure_database_exists, ensure_tables, resources, AppState, DataSources, PgDataSource, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.mode.default_log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::debug!(?settings, "settings loaded");

    let panel = resources::panel(&settings)?;

    let mut data_sources = DataSources::default();
    for ds in &panel.data_sources {
        ensure_database_exists(&ds.url).await?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&ds.url)
            .await?;
        ensure_tables(&pool, &panel, &ds.id).await?;
        data_sources.insert(&ds.id, Arc::new(PgDataSource::new(pool)));
    }

    let port = settings.app_port;
    let state = AppState::new(panel, data_sources, settings)?;
    let app = app_router(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "admin panel available at http://localhost:{}/admin", port);
    axum::serve(listener, app).await?;
    Ok(())
}
