//! Storage service for file operations.
//!
//! This module owns the media and thumbnail directories. The media directory
//! is the sole source of truth for what media exists; metadata is layered on
//! top by the sidecar store.
//!
//! # File Organization
//!
//! ```text
//! data/
//! ├── media/              # Stored media files, flat, keyed by filename
//! │   ├── sunset.jpg
//! │   └── clip.mp4
//! ├── thumbnails/         # Video thumbnails: <stem>.jpg
//! │   └── clip.jpg
//! ├── descriptions.json   # Sidecar: filename -> description
//! └── albums.json         # Sidecar: filename -> album
//! ```
//!
//! Stored filenames are computed once at placement time according to the
//! configured naming policy and used as the item identity everywhere after.

use crate::config::{NamingPolicy, StorageConfig};
use crate::error::{AppError, Result};
use crate::models::thumbnail_filename;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Service for managing file storage operations
#[derive(Debug, Clone)]
pub struct StorageService {
    /// Path to the media directory
    media_dir: PathBuf,
    /// Path to the thumbnail directory
    thumbnail_dir: PathBuf,
    /// Naming policy for stored files
    naming: NamingPolicy,
}

impl StorageService {
    /// Create a new storage service and initialize directories
    ///
    /// # Errors
    /// Returns `Storage` if the directories cannot be created
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let service = Self {
            media_dir: config.media_path(),
            thumbnail_dir: config.thumbnail_path(),
            naming: config.naming,
        };

        service.init_directories().await?;

        info!(
            media = %service.media_dir.display(),
            thumbnails = %service.thumbnail_dir.display(),
            naming = ?service.naming,
            "Storage service initialized"
        );

        Ok(service)
    }

    /// Initialize storage directories
    async fn init_directories(&self) -> Result<()> {
        for dir in [&self.media_dir, &self.thumbnail_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir).await.map_err(|e| {
                    AppError::storage(format!(
                        "Cannot create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
                debug!(path = %dir.display(), "Created storage directory");
            }
        }
        Ok(())
    }

    /// Compute the stored filename for a validated upload
    ///
    /// Under `preserve`, the sanitized original name is kept and colliding
    /// uploads silently overwrite. Under `unique`, a UUID v4 replaces the
    /// name; the extension is carried over so kind classification and
    /// transcoding decisions still work.
    pub fn place(&self, sanitized_filename: &str, extension: &str) -> String {
        match self.naming {
            NamingPolicy::Preserve => sanitized_filename.to_string(),
            NamingPolicy::Unique => format!("{}.{}", Uuid::new_v4(), extension),
        }
    }

    /// Full path of a stored file
    pub fn media_file_path(&self, stored_filename: &str) -> PathBuf {
        self.media_dir.join(stored_filename)
    }

    /// Full path of a stored file's thumbnail
    pub fn thumbnail_file_path(&self, stored_filename: &str) -> PathBuf {
        self.thumbnail_dir.join(thumbnail_filename(stored_filename))
    }

    /// The thumbnail directory (served statically)
    pub fn thumbnail_dir(&self) -> &PathBuf {
        &self.thumbnail_dir
    }

    /// Save a media file under its stored filename
    pub async fn save_media(&self, stored_filename: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.media_file_path(stored_filename);
        fs::write(&path, data).await?;

        debug!(
            filename = %stored_filename,
            size = data.len(),
            "Saved media file"
        );

        Ok(path)
    }

    /// Check whether a stored file exists
    pub fn media_exists(&self, stored_filename: &str) -> bool {
        self.media_file_path(stored_filename).exists()
    }

    /// Delete a stored media file
    ///
    /// Returns `true` if the file existed.
    pub async fn delete_media(&self, stored_filename: &str) -> Result<bool> {
        let path = self.media_file_path(stored_filename);

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).await?;
        debug!(filename = %stored_filename, "Deleted media file");
        Ok(true)
    }

    /// Delete a stored file's thumbnail, if present
    pub async fn delete_thumbnail(&self, stored_filename: &str) -> Result<bool> {
        let path = self.thumbnail_file_path(stored_filename);

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).await?;
        debug!(filename = %stored_filename, "Deleted thumbnail");
        Ok(true)
    }

    /// Enumerate stored files with their modification times
    ///
    /// Returns every regular file in the media directory; extension
    /// filtering against the allow-list is the caller's concern so that the
    /// listing and the validator share one classification.
    pub async fn list_media(&self) -> Result<Vec<(String, DateTime<Utc>)>> {
        let mut entries = fs::read_dir(&self.media_dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };

            let modified: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::from)
                .unwrap_or_else(|_| Utc::now());

            files.push((name, modified));
        }

        Ok(files)
    }

    /// Count files in a directory (health stats)
    async fn file_count(dir: &PathBuf) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let mut count = 0;
        let mut entries = fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.metadata().await?.is_file() {
                count += 1;
            }
        }

        Ok(count)
    }

    /// Number of stored media files
    pub async fn media_count(&self) -> Result<usize> {
        Self::file_count(&self.media_dir).await
    }

    /// Number of stored thumbnails
    pub async fn thumbnail_count(&self) -> Result<usize> {
        Self::file_count(&self.thumbnail_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_service(naming: NamingPolicy) -> (StorageService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            media_dir: "media".to_string(),
            thumbnail_dir: "thumbnails".to_string(),
            naming,
        };

        let service = StorageService::new(&config).await.unwrap();
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_save_and_delete_media() {
        let (service, _temp) = create_test_service(NamingPolicy::Preserve).await;

        service.save_media("photo.jpg", b"jpeg bytes").await.unwrap();
        assert!(service.media_exists("photo.jpg"));

        assert!(service.delete_media("photo.jpg").await.unwrap());
        assert!(!service.media_exists("photo.jpg"));

        // Second delete reports the file as already gone
        assert!(!service.delete_media("photo.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_place_preserve_keeps_name() {
        let (service, _temp) = create_test_service(NamingPolicy::Preserve).await;
        assert_eq!(service.place("sunset.png", "png"), "sunset.png");
    }

    #[tokio::test]
    async fn test_place_unique_generates_distinct_names() {
        let (service, _temp) = create_test_service(NamingPolicy::Unique).await;

        let a = service.place("sunset.png", "png");
        let b = service.place("sunset.png", "png");

        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
        assert!(b.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_thumbnail_path_convention() {
        let (service, _temp) = create_test_service(NamingPolicy::Preserve).await;

        let path = service.thumbnail_file_path("clip.mp4");
        assert!(path.ends_with("thumbnails/clip.jpg"));
    }

    #[tokio::test]
    async fn test_list_media() {
        let (service, _temp) = create_test_service(NamingPolicy::Preserve).await;

        service.save_media("a.jpg", b"a").await.unwrap();
        service.save_media("b.mp4", b"b").await.unwrap();

        let mut names: Vec<String> = service
            .list_media()
            .await
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["a.jpg", "b.mp4"]);
    }
}
