use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinematch_api::{
    catalog::{CatalogPaths, CatalogStore},
    config::Config,
    routes::{create_router, AppState},
    services::{EngineSettings, ImdbThumbnailProvider, RecommendationEngine},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let paths = CatalogPaths::new(&config.movies_path, &config.features_path);

    let catalog = {
        let paths = paths.clone();
        tokio::task::spawn_blocking(move || CatalogStore::load(&paths)).await??
    };
    tracing::info!(
        movies = catalog.len(),
        dimension = catalog.dimension(),
        "Catalog loaded"
    );

    let engine = Arc::new(RecommendationEngine::new(
        catalog,
        EngineSettings {
            metric: config.neighbor_metric,
            oversampling: config.oversampling,
        },
    ));
    {
        let engine = engine.clone();
        tokio::task::spawn_blocking(move || engine.warm_up()).await?;
    }
    tracing::info!(settings = ?engine.settings(), "Neighbor indexes ready");

    let thumbnails = Arc::new(ImdbThumbnailProvider::new(Duration::from_secs(
        config.thumbnail_timeout_secs,
    ))?);

    let state = AppState::new(engine, thumbnails, paths, config.max_recommendations);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server running on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
