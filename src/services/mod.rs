//! Service layer for the gallery server.
//!
//! This module contains business logic services that handle:
//! - Upload validation (allow-list, filename sanitization)
//! - File storage operations
//! - Sidecar metadata (descriptions, albums)
//! - Format conversion via ffmpeg

pub mod metadata;
pub mod storage;
pub mod transcoder;
pub mod validator;

pub use metadata::MetadataStore;
pub use storage::StorageService;
pub use transcoder::{FfmpegTranscoder, Transcoder};
pub use validator::{ValidatedUpload, Validator};
