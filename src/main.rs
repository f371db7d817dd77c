#![deny(unused_crate_dependencies)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod config;
mod error;
mod fetch;
mod params;
mod parse;
mod respond;
mod route;

use std::sync::Arc;

use axum::{http::Method, routing::get, Router};
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::{compression::CompressionLayer, cors::Any};
use url::Url;

use crate::{config::Config, fetch::make_client};

pub use error::Result;

/// Immutable state shared by every request.
#[derive(Debug)]
pub struct AppState {
    client: Client,
    portal: Url,
}

#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub fn app(state: Arc<AppState>) -> Router {
    let compression_layer: CompressionLayer = CompressionLayer::new()
        .br(true)
        .deflate(true)
        .gzip(true)
        .zstd(true);
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    Router::new()
        .route("/", get(route::root))
        .route("/*path", get(route::nested))
        .with_state(state)
        .layer(cors_layer)
        .layer(compression_layer)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> core::result::Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let config = Config::from_env()?;
    log::debug!("{config:?}");
    let state = Arc::new(AppState {
        client: make_client(config.timeout)?,
        portal: config.portal,
    });
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|e| format!("failed to listen on {}: {e}", config.addr))?;
    log::info!("listening on http://{}", config.addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}
