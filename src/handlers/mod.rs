//! HTTP request handlers for the gallery server.
//!
//! This module contains all endpoint handlers organized by functionality:
//! - `upload`: Multi-file upload and the ingestion pipeline
//! - `gallery`: The listing join and album views
//! - `media`: Per-item operations (serve, download, delete, describe, album)
//! - `health`: Health check endpoints

pub mod gallery;
pub mod health;
pub mod media;
pub mod upload;

pub use gallery::album_routes;
pub use health::health_routes;
pub use media::media_routes;
pub use upload::upload_routes;
