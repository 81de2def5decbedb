//! Media item model and related types.
//!
//! The identity of a media item is its stored filename, unique within the
//! media directory. Everything else (kind, description, album, thumbnail)
//! hangs off that name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media kind classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Image file (PNG, JPEG, GIF, BMP, WebP, HEIC)
    Image,
    /// Video file (MP4, MOV, AVI, MKV, WebM)
    Video,
}

impl MediaKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// A media item as it appears in the gallery listing
///
/// Built by joining a directory entry against the metadata store; files
/// without metadata get `None` for description and album.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    /// Stored filename (the item's identity)
    pub stored_filename: String,

    /// Media kind (image or video)
    pub kind: MediaKind,

    /// Optional free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional album label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Filesystem modification time (listing sort key, descending)
    pub modified_at: DateTime<Utc>,

    /// Public URL to view the item
    pub url: String,

    /// Thumbnail URL (videos only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl MediaItem {
    /// Build a listing entry for a stored file
    pub fn new(
        stored_filename: String,
        kind: MediaKind,
        modified_at: DateTime<Utc>,
        base_url: &str,
    ) -> Self {
        let url = format!("{}/api/media/{}", base_url, stored_filename);
        let thumbnail_url = match kind {
            MediaKind::Video => Some(format!(
                "{}/thumbs/{}",
                base_url,
                thumbnail_filename(&stored_filename)
            )),
            MediaKind::Image => None,
        };

        Self {
            stored_filename,
            kind,
            description: None,
            album: None,
            modified_at,
            url,
            thumbnail_url,
        }
    }

    /// Attach metadata looked up from the sidecar store
    pub fn with_metadata(mut self, description: Option<String>, album: Option<String>) -> Self {
        self.description = description;
        self.album = album;
        self
    }
}

/// Thumbnail naming convention: `<stored-filename-without-extension>.jpg`
pub fn thumbnail_filename(stored_filename: &str) -> String {
    let stem = stored_filename
        .rsplit_once('.')
        .map(|(stem, _ext)| stem)
        .unwrap_or(stored_filename);
    format!("{}.jpg", stem)
}

/// Outcome of one file within an upload batch
#[derive(Debug, Clone, Serialize)]
pub struct UploadItemOutcome {
    /// Filename as submitted by the client
    pub original_filename: String,

    /// Stored filename, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_filename: Option<String>,

    /// Whether the item was stored
    pub stored: bool,

    /// Failure reason, present when the item was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadItemOutcome {
    /// Record a successfully stored item
    pub fn stored(original_filename: String, stored_filename: String) -> Self {
        Self {
            original_filename,
            stored_filename: Some(stored_filename),
            stored: true,
            error: None,
        }
    }

    /// Record a skipped item and the cause
    pub fn failed(original_filename: String, error: String) -> Self {
        Self {
            original_filename,
            stored_filename: None,
            stored: false,
            error: Some(error),
        }
    }
}

/// Response DTO for an upload batch
///
/// No item's failure aborts the batch; the report says how many succeeded
/// versus failed and carries the full refreshed listing.
#[derive(Debug, Serialize)]
pub struct UploadReport {
    /// Number of files stored
    pub succeeded: usize,
    /// Number of files skipped
    pub failed: usize,
    /// Per-item outcomes, in submission order
    pub items: Vec<UploadItemOutcome>,
    /// The refreshed gallery listing
    pub media: Vec<MediaItem>,
}

/// Outcome of a single-item mutation (delete/describe/assign-album)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The item was deleted
    Deleted,
    /// Metadata was written
    Updated,
    /// The target filename does not exist; nothing was changed
    NotFound,
}

/// Response DTO for single-item mutations
///
/// Operations on a missing filename report `not_found` as a soft outcome
/// rather than a hard error; sidecar files are left untouched.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub outcome: MutationOutcome,
    pub filename: String,
}

/// Request body for setting a description
///
/// An empty description clears the entry.
#[derive(Debug, Deserialize)]
pub struct DescribeRequest {
    pub description: String,
}

/// Request body for assigning an album label
///
/// An empty album clears the entry.
#[derive(Debug, Deserialize)]
pub struct AssignAlbumRequest {
    pub album: String,
}

/// Response DTO for the album list
#[derive(Debug, Serialize)]
pub struct AlbumsResponse {
    /// Distinct album labels, sorted
    pub albums: Vec<String>,
}
