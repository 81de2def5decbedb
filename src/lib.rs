//! # Media Gallery Server
//!
//! A self-hosted media gallery server written in Rust.
//!
//! ## Features
//!
//! - **Batch Upload**: Multi-file multipart upload with per-item outcomes
//! - **Format Conversion**: HEIC stills to JPEG, QuickTime video to MP4
//! - **Video Thumbnails**: One representative frame per video via ffmpeg
//! - **Sidecar Metadata**: Descriptions and album labels in flat JSON files
//! - **Gallery Listing**: Directory scan joined with metadata, newest first
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  HTTP Server                     │
//! │  ┌──────────┐ ┌──────────┐ ┌───────┐ ┌───────┐ │
//! │  │ Upload   │ │ Gallery  │ │ Media │ │ Thumbs│ │
//! │  └──────────┘ └──────────┘ └───────┘ └───────┘ │
//! ├─────────────────────────────────────────────────┤
//! │                   Services                       │
//! │  ┌───────────┐ ┌─────────┐ ┌──────────────────┐ │
//! │  │ Validator │ │ Storage │ │ Metadata │ ffmpeg│ │
//! │  └───────────┘ └─────────┘ └──────────────────┘ │
//! ├─────────────────────────────────────────────────┤
//! │          File System (media/, thumbnails/,       │
//! │          descriptions.json, albums.json)         │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server
//! cargo run --release
//!
//! # Upload a batch
//! curl -X POST http://localhost:3000/api/upload \
//!     -F "file=@photo.heic" -F "file=@clip.mov" -F "album=Holiday"
//!
//! # List the gallery
//! curl http://localhost:3000/api/media
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber from the logging configuration
///
/// A `RUST_LOG` environment filter takes precedence over the configured
/// level when set.
pub fn init_tracing(config: &config::LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

/// Run the gallery server with the given configuration.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config.clone()).await?;

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("Invalid server address");

    info!(
        address = %addr,
        data_dir = %config.storage.data_dir.display(),
        "Gallery server starting"
    );

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Per-file limit is enforced in the upload handler; the body limit
    // bounds the whole multipart request with headroom for field framing.
    // Axum's own extractor limit must be lifted to match.
    let request_limit = multipart_request_limit(state.config.upload.max_upload_size);
    let body_limit = RequestBodyLimitLayer::new(request_limit);

    let timeout = TimeoutLayer::new(Duration::from_secs(state.config.server.request_timeout));

    let thumbnails = ServeDir::new(state.storage.thumbnail_dir());

    Router::new()
        .nest("/api/upload", handlers::upload_routes())
        .nest("/api/media", handlers::media_routes())
        .nest("/api/albums", handlers::album_routes())
        .nest("/health", handlers::health_routes())
        .nest_service("/thumbs", thumbnails)
        .layer(cors)
        .layer(DefaultBodyLimit::max(request_limit))
        .layer(body_limit)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Whole-request body bound: room for a multi-file batch plus field framing
///
/// Saturates instead of wrapping when the configured per-file size is large
/// relative to the target's pointer width.
fn multipart_request_limit(max_upload_size: u64) -> usize {
    let bytes = max_upload_size.saturating_mul(8).saturating_add(1024);
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_request_limit() {
        assert_eq!(multipart_request_limit(10), 10 * 8 + 1024);
        assert_eq!(multipart_request_limit(u64::MAX), usize::MAX);
    }
}
