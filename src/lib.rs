//! Puzzle solve statistics service with per-client rate limiting.
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=puzzle_stats=debug`.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod stats;
pub mod store;
pub mod worker;

use config::Args;
use handlers::{health_handler, metrics_handler, solve_handler, star_handler, stats_handler};
use state::AppState;
use store::MemoryStore;
use worker::rate_limit_sweeper;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| warn!("Ignoring invalid CORS origin {origin}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

// creating the router with routes
pub fn app(state: Arc<AppState>, origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/puzzle/solve", post(solve_handler))
        .route("/puzzle/star", post(star_handler))
        .route("/puzzle/stats/{code}", get(stats_handler))
        .layer(cors_layer(origins))
        .with_state(state)
}

pub async fn start_server(args: Args) -> std::io::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let limits = args.limits();
    let state = AppState::new(Arc::new(MemoryStore::new()), limits);

    // spawn the background sweeper
    let sweep_interval = Duration::from_secs(args.sweep_interval.max(1));
    tokio::spawn(rate_limit_sweeper(state.clone(), sweep_interval));

    let router = app(state, &args.origins());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Puzzle stats running on http://localhost:{}", args.port);
    info!("Allowed origins: {}", args.allowed_origins);
    info!(
        "Rate limits per {:?}: solve {}, star {}, stats {}",
        limits.solve.window,
        limits.solve.max_requests,
        limits.star.max_requests,
        limits.stats.max_requests
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
