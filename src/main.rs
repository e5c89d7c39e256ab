use std::sync::Arc;

use marquee_api::{
    api::{create_router, AppState},
    config::Config,
    services::providers::{HttpOmdbApi, MetadataProvider, OmdbProvider},
    store::IndexStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marquee_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // `marquee-api build` rebuilds the index and exits
    let rebuild_only = std::env::args().nth(1).as_deref() == Some("build");

    let store = IndexStore::new(config.index_dir.clone());
    let corpus_source = config.corpus_source();
    let max_features = config.max_features;
    tracing::info!(
        corpus = %corpus_source.display(),
        index_dir = %config.index_dir.display(),
        "Preparing index"
    );

    let index = tokio::task::spawn_blocking(move || {
        if rebuild_only {
            store.rebuild(&corpus_source, max_features)
        } else {
            store.open_or_build(&corpus_source, max_features)
        }
    })
    .await??;

    if rebuild_only {
        tracing::info!(build_id = %index.build_id(), "Index rebuilt");
        return Ok(());
    }

    let metadata: Option<Arc<dyn MetadataProvider>> = match &config.omdb_api_key {
        Some(api_key) => {
            let api = HttpOmdbApi::new(
                api_key.clone(),
                config.omdb_api_url.clone(),
                config.omdb_timeout(),
            )?;
            let provider: Arc<dyn MetadataProvider> = Arc::new(OmdbProvider::new(api));
            Some(provider)
        }
        None => {
            tracing::warn!("OMDB_API_KEY not set; recommendation details disabled");
            None
        }
    };

    // Initialize application state
    let state = AppState::new(Arc::new(index), metadata);

    // Create the router with all routes
    let app = create_router(state);

    // Start the server
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
