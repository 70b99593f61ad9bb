use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser; // for cli
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_gateway::cache::ImageCache;
use portfolio_gateway::config::Args;
use portfolio_gateway::content::ContentSnapshot;
use portfolio_gateway::image::{HttpImageStore, ImageNormalizer, ImageStore, LocalImageStore};
use portfolio_gateway::rate_limit::{RateLimiter, spawn_sweeper};
use portfolio_gateway::state::AppState;
use portfolio_gateway::{build_router, cors_layer};

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // parse cli arguments
    let args = Args::parse();

    let image_store: Arc<dyn ImageStore> = match &args.storage_url {
        Some(url) => Arc::new(HttpImageStore::new(reqwest::Client::new(), url)),
        None => Arc::new(LocalImageStore::new(&args.storage_dir)),
    };
    let content = ContentSnapshot::load(&args.content_file).context("failed to load content")?;

    // creating shared state
    let state = Arc::new(AppState {
        rate_limiter: Arc::new(RateLimiter::in_memory(args.rate_limit())),
        normalizer: ImageNormalizer::default(),
        image_store,
        image_cache: ImageCache::new(args.image_cache_ttl(), args.image_cache_entries),
        content,
    });

    // background sweep of expired rate limit records
    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(Arc::clone(&state.rate_limiter), shutdown.clone());

    let app = build_router(Arc::clone(&state), cors_layer(&args));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Gateway listening");
    info!(
        max_requests = args.max_requests,
        window_ms = args.window_ms,
        "Rate limit configured"
    );
    info!(
        store = state.image_store.scheme(),
        cache_ttl = args.image_cache_ttl,
        cache_entries = args.image_cache_entries,
        "Image proxy configured"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .context("server error")?;

    shutdown.cancel();
    sweeper.await.context("sweeper task failed")?;
    info!("Gateway stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => {},
    }

    shutdown.cancel();
}
