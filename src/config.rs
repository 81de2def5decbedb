//! Configuration module for the gallery server.
//!
//! This module handles loading and validating configuration from TOML files.
//! Configuration can be loaded from a file path or from default locations.
//! The loaded `Config` is constructed once at startup and passed explicitly
//! to each component; nothing reads configuration ambiently.
//!
//! # Configuration Sources (in order of priority)
//! 1. `config.local.toml` - Local overrides (gitignored)
//! 2. `config.toml` - Main configuration file
//!
//! # Example
//! ```rust,ignore
//! let config = Config::load("config.toml")?;
//! println!("Server will listen on {}:{}", config.server.host, config.server.port);
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for generating media and thumbnail URLs
    pub base_url: String,
    /// Request timeout in seconds
    pub request_timeout: u64,
}

/// Policy for naming stored files
///
/// Whichever policy is selected, the stored filename computed at upload time
/// is the identity used everywhere afterwards: metadata keys, thumbnail
/// names, and listing entries all agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// Keep the sanitized original filename; colliding uploads overwrite
    #[default]
    Preserve,
    /// Generate a UUID v4 per upload; collision-free, content-independent
    Unique,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all data
    pub data_dir: PathBuf,
    /// Directory for media files (relative to data_dir)
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
    /// Directory for video thumbnails (relative to data_dir)
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: String,
    /// Naming policy for stored files
    #[serde(default)]
    pub naming: NamingPolicy,
}

fn default_media_dir() -> String {
    "media".to_string()
}

fn default_thumbnail_dir() -> String {
    "thumbnails".to_string()
}

impl StorageConfig {
    /// Get the full path to the media directory
    pub fn media_path(&self) -> PathBuf {
        self.data_dir.join(&self.media_dir)
    }

    /// Get the full path to the thumbnail directory
    pub fn thumbnail_path(&self) -> PathBuf {
        self.data_dir.join(&self.thumbnail_dir)
    }

    /// Get the path to the description sidecar file
    pub fn description_sidecar_path(&self) -> PathBuf {
        self.data_dir.join("descriptions.json")
    }

    /// Get the path to the album sidecar file
    pub fn album_sidecar_path(&self) -> PathBuf {
        self.data_dir.join("albums.json")
    }
}

/// Upload configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum file size per upload (bytes)
    pub max_upload_size: u64,
    /// Allowed file extensions for images (lowercase, no dot)
    #[serde(default = "default_image_extensions")]
    pub allowed_image_extensions: Vec<String>,
    /// Allowed file extensions for videos (lowercase, no dot)
    #[serde(default = "default_video_extensions")]
    pub allowed_video_extensions: Vec<String>,
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "bmp", "webp", "heic"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_video_extensions() -> Vec<String> {
    ["mp4", "mov", "avi", "mkv", "webm"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl UploadConfig {
    /// Check if an extension is allowed for images (case-insensitive)
    pub fn is_allowed_image_extension(&self, ext: &str) -> bool {
        self.allowed_image_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Check if an extension is allowed for videos (case-insensitive)
    pub fn is_allowed_video_extension(&self, ext: &str) -> bool {
        self.allowed_video_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Check if an extension is allowed (image or video)
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.is_allowed_image_extension(ext) || self.is_allowed_video_extension(ext)
    }
}

/// Transcoding configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TranscodeConfig {
    /// Path to the ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Hard timeout for a single conversion in seconds
    #[serde(default = "default_transcode_timeout")]
    pub timeout_seconds: u64,
    /// Offset into the video for the representative thumbnail frame
    #[serde(default = "default_thumbnail_offset")]
    pub thumbnail_offset_seconds: f64,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_transcode_timeout() -> u64 {
    120
}

fn default_thumbnail_offset() -> f64 {
    1.0
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_seconds: default_transcode_timeout(),
            thumbnail_offset_seconds: default_thumbnail_offset(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Config {
    /// Load configuration from a file path
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Tries to load from:
    /// 1. `config.local.toml` (if exists)
    /// 2. `config.toml`
    ///
    /// # Errors
    /// Returns `ConfigError` if no configuration file is found
    pub fn load_default() -> Result<Self, ConfigError> {
        // Try local config first
        if Path::new("config.local.toml").exists() {
            return Self::load("config.local.toml");
        }

        // Fall back to main config
        if Path::new("config.toml").exists() {
            return Self::load("config.toml");
        }

        Err(ConfigError::ValidationError(
            "No configuration file found. Expected config.toml or config.local.toml".to_string(),
        ))
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        // Validate base_url doesn't have trailing slash
        if self.server.base_url.ends_with('/') {
            return Err(ConfigError::ValidationError(
                "base_url should not have a trailing slash".to_string(),
            ));
        }

        // Allow-lists must not be empty or contain dotted entries
        if self.upload.allowed_image_extensions.is_empty()
            && self.upload.allowed_video_extensions.is_empty()
        {
            return Err(ConfigError::ValidationError(
                "at least one of allowed_image_extensions/allowed_video_extensions must be non-empty"
                    .to_string(),
            ));
        }

        for ext in self
            .upload
            .allowed_image_extensions
            .iter()
            .chain(&self.upload.allowed_video_extensions)
        {
            if ext.is_empty() || ext.contains('.') {
                return Err(ConfigError::ValidationError(format!(
                    "invalid extension in allow-list: {:?} (expected e.g. \"jpg\", not \".jpg\")",
                    ext
                )));
            }
        }

        if self.upload.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_upload_size must be greater than 0".to_string(),
            ));
        }

        // The ffmpeg path ends up on a command line; reject shell metacharacters
        let dangerous = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
        if self
            .transcode
            .ffmpeg_path
            .chars()
            .any(|c| dangerous.contains(&c))
        {
            return Err(ConfigError::ValidationError(
                "ffmpeg_path contains unsafe characters".to_string(),
            ));
        }

        if self.transcode.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "transcode timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.transcode.thumbnail_offset_seconds < 0.0 {
            return Err(ConfigError::ValidationError(
                "thumbnail_offset_seconds must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}
