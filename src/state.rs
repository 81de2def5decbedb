//! Application state management.
//!
//! This module defines the shared application state that is accessible
//! from all request handlers via Axum's State extractor.
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn handler(State(state): State<AppState>) -> impl IntoResponse {
//!     let items = state.storage.list_media().await?;
//!     // ...
//! }
//! ```

use crate::config::Config;
use crate::error::Result;
use crate::services::{FfmpegTranscoder, MetadataStore, StorageService, Transcoder, Validator};
use std::sync::Arc;

/// Shared application state
///
/// This struct holds all shared resources that handlers need access to.
/// It's cheap to clone into each request handler.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Upload validator (allow-list, sanitization)
    pub validator: Arc<Validator>,

    /// Storage service for file operations
    pub storage: Arc<StorageService>,

    /// Sidecar metadata store (descriptions, albums)
    pub metadata: Arc<MetadataStore>,

    /// Format converter
    pub transcoder: Arc<dyn Transcoder>,
}

impl AppState {
    /// Create a new application state
    ///
    /// # Errors
    /// Returns error if the storage directories cannot be initialized
    pub async fn new(config: Config) -> Result<Self> {
        let validator = Validator::new(&config.upload);
        let storage = StorageService::new(&config.storage).await?;
        let metadata = MetadataStore::new(&config.storage);
        let transcoder = FfmpegTranscoder::new(&config.transcode);

        Ok(Self {
            config: Arc::new(config),
            validator: Arc::new(validator),
            storage: Arc::new(storage),
            metadata: Arc::new(metadata),
            transcoder: Arc::new(transcoder),
        })
    }

    /// Get the base URL for media URLs
    pub fn base_url(&self) -> &str {
        &self.config.server.base_url
    }

    /// Get the maximum upload size per file
    pub fn max_upload_size(&self) -> u64 {
        self.config.upload.max_upload_size
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("validator", &"<Validator>")
            .field("storage", &"<StorageService>")
            .field("metadata", &"<MetadataStore>")
            .field("transcoder", &"<Transcoder>")
            .finish()
    }
}
