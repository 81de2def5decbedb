//! Gallery listing and album views.
//!
//! The listing enumerates the media directory, keeps only allow-listed
//! extensions, joins each file against the sidecar metadata by stored
//! filename, classifies image/video, attaches thumbnail URLs for videos,
//! and sorts by descending modification time.
//!
//! Metadata entries with no corresponding file are ignored; files with no
//! metadata get empty description/album.

use axum::{extract::State, routing::get, Json, Router};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{AlbumsResponse, MediaItem, MediaKind};
use crate::state::AppState;

/// Build the enriched, sorted gallery listing
pub async fn build_listing(state: &AppState) -> Result<Vec<MediaItem>> {
    let files = state.storage.list_media().await?;
    let (descriptions, albums) = state.metadata.snapshot().await?;

    let mut items: Vec<MediaItem> = Vec::with_capacity(files.len());

    for (name, modified) in files {
        let Some(extension) = name.rsplit_once('.').map(|(_, ext)| ext) else {
            continue;
        };
        // Files outside the allow-list never surface in the listing
        let Some(kind) = state.validator.classify(extension) else {
            continue;
        };

        if kind == MediaKind::Video {
            backfill_thumbnail(state, &name).await;
        }

        let item = MediaItem::new(name.clone(), kind, modified, state.base_url())
            .with_metadata(descriptions.get(&name).cloned(), albums.get(&name).cloned());
        items.push(item);
    }

    // Newest first; name as tie-breaker for deterministic output
    items.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| a.stored_filename.cmp(&b.stored_filename))
    });

    debug!(count = items.len(), "Built gallery listing");

    Ok(items)
}

/// Best-effort regeneration for a video that has no thumbnail
///
/// Extraction can fail at upload time without failing the upload; the next
/// listing retries it here. Failure only logs, the item is still listed.
async fn backfill_thumbnail(state: &AppState, stored_filename: &str) {
    let thumbnail = state.storage.thumbnail_file_path(stored_filename);
    if thumbnail.exists() {
        return;
    }

    let input = state.storage.media_file_path(stored_filename);
    if let Err(e) = state.transcoder.video_thumbnail(&input, &thumbnail).await {
        warn!(filename = %stored_filename, error = %e, "Thumbnail backfill failed");
    }
}

/// The gallery listing
///
/// GET /api/media
pub async fn list_media(State(state): State<AppState>) -> Result<Json<Vec<MediaItem>>> {
    Ok(Json(build_listing(&state).await?))
}

/// Distinct album labels
///
/// GET /api/albums
async fn list_albums(State(state): State<AppState>) -> Result<Json<AlbumsResponse>> {
    let albums = state.metadata.album_labels().await?;
    Ok(Json(AlbumsResponse { albums }))
}

/// Create album routes
pub fn album_routes() -> Router<AppState> {
    Router::new().route("/", get(list_albums))
}
