use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use muse_api::api::{create_router, AppState};
use muse_api::config::Config;
use muse_api::services::{CatalogSnapshot, SimilarityTable};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muse_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Missing or corrupt artifacts are fatal: without them there is nothing
    // to serve, so fail here rather than per request.
    let snapshot = CatalogSnapshot::load(
        Path::new(&config.personal_recs_path),
        Path::new(&config.popular_recs_path),
    )
    .with_context(|| {
        format!(
            "loading offline tables from {} and {}",
            config.personal_recs_path, config.popular_recs_path
        )
    })?;
    let table = SimilarityTable::load(Path::new(&config.similar_tracks_path))
        .with_context(|| format!("loading similarity table from {}", config.similar_tracks_path))?;

    tracing::info!(
        personal_users = snapshot.personal_user_count(),
        popular_tracks = snapshot.popular_len(),
        "offline tables loaded"
    );

    let state = AppState::new(&config, snapshot, table);

    if config.catalog_refresh_secs > 0 {
        tokio::spawn(refresh_artifacts(state.clone(), config.clone()));
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically rebuilds the artifact snapshots and swaps them in. A failed
/// reload keeps the previous snapshot; serving is never interrupted.
async fn refresh_artifacts(state: AppState, config: Config) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.catalog_refresh_secs));
    // The first tick fires immediately; startup already loaded everything.
    interval.tick().await;

    loop {
        interval.tick().await;

        match CatalogSnapshot::load(
            Path::new(&config.personal_recs_path),
            Path::new(&config.popular_recs_path),
        ) {
            Ok(snapshot) => {
                tracing::info!(
                    personal_users = snapshot.personal_user_count(),
                    popular_tracks = snapshot.popular_len(),
                    "offline tables refreshed"
                );
                state.catalog.replace(snapshot);
            }
            Err(e) => {
                tracing::warn!(error = %e, "offline table refresh failed, keeping previous snapshot");
            }
        }

        match SimilarityTable::load(Path::new(&config.similar_tracks_path)) {
            Ok(table) => {
                state.similarity.replace(table);
                tracing::info!(
                    similarity_pairs = state.similarity.pair_count(),
                    "similarity table refreshed"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "similarity table refresh failed, keeping previous snapshot");
            }
        }
    }
}
