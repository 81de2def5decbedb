//! Upload handler and the ingestion pipeline.
//!
//! `POST /api/upload` accepts a multipart form with one or more `file`
//! parts, an optional `album` text field that applies to the whole batch,
//! and optional `description` fields: a description following a `file`
//! part annotates that file, one sent before any file applies to files
//! without their own.
//!
//! Each file runs through the pipeline stages in order: validate →
//! place → write → transcode → metadata. A failing item is recorded in the
//! batch report and never aborts the remaining items; the response carries
//! per-item outcomes and the refreshed gallery listing.
//!
//! # Example
//!
//! ```bash
//! curl -X POST http://localhost:3000/api/upload \
//!   -F "file=@sunset.jpg" \
//!   -F "file=@clip.mov" \
//!   -F "album=holiday"
//! ```

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{MediaKind, UploadItemOutcome, UploadReport};
use crate::state::AppState;

use super::gallery::build_listing;

/// One `file` part with the description that annotates it, if any
struct IncomingFile {
    filename: String,
    data: Vec<u8>,
    description: Option<String>,
}

/// Handle a multi-file upload via multipart form
///
/// POST /api/upload
async fn upload_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadReport>)> {
    let mut files: Vec<IncomingFile> = Vec::new();
    let mut album: Option<String> = None;
    let mut batch_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart data: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read file: {}", e)))?;

                files.push(IncomingFile {
                    filename,
                    data: data.to_vec(),
                    description: None,
                });
            }
            "album" => {
                album = Some(field.text().await.map_err(|e| {
                    AppError::validation(format!("Failed to read album field: {}", e))
                })?);
            }
            "description" => {
                let text = field.text().await.map_err(|e| {
                    AppError::validation(format!("Failed to read description field: {}", e))
                })?;

                // A description annotates the file part preceding it; one
                // arriving before any file becomes the batch default.
                match files.last_mut() {
                    Some(file) => file.description = Some(text),
                    None => batch_description = Some(text),
                }
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(AppError::validation(
            "No file field found in multipart request",
        ));
    }

    let mut items = Vec::with_capacity(files.len());
    let mut succeeded = 0;
    let mut failed = 0;

    for file in files {
        let description = file.description.as_deref().or(batch_description.as_deref());

        match ingest_file(&state, &file.filename, &file.data, album.as_deref(), description).await
        {
            Ok(stored) => {
                info!(
                    original = %file.filename,
                    stored = %stored,
                    size = file.data.len(),
                    "Stored upload"
                );
                succeeded += 1;
                items.push(UploadItemOutcome::stored(file.filename, stored));
            }
            Err(e) => {
                warn!(original = %file.filename, error = %e, "Skipped upload");
                failed += 1;
                items.push(UploadItemOutcome::failed(file.filename, e.to_string()));
            }
        }
    }

    let media = build_listing(&state).await?;

    let status = if succeeded > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(UploadReport {
            succeeded,
            failed,
            items,
            media,
        }),
    ))
}

/// Run one file through the ingestion pipeline
///
/// Returns the final stored filename (the extension may differ from the
/// upload's after transcoding).
pub async fn ingest_file(
    state: &AppState,
    original_filename: &str,
    data: &[u8],
    album: Option<&str>,
    description: Option<&str>,
) -> Result<String> {
    if data.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }

    if data.len() as u64 > state.max_upload_size() {
        return Err(AppError::payload_too_large(format!(
            "File size {} exceeds maximum allowed size {}",
            data.len(),
            state.max_upload_size()
        )));
    }

    // Stage 1: validate
    let validated = state.validator.validate(original_filename)?;

    // Stage 2: place and write
    let stored = state
        .storage
        .place(&validated.sanitized_filename, &validated.extension);
    state.storage.save_media(&stored, data).await?;

    // Stage 3: transcode non-web-native formats
    let stored = match validated.extension.as_str() {
        "heic" => convert_stored(state, &stored, "jpg").await?,
        "mov" => convert_stored(state, &stored, "mp4").await?,
        _ => stored,
    };

    // Stage 3b: video thumbnail, regenerated only if absent. A thumbnail
    // failure never rolls back the otherwise-successful upload.
    if validated.kind == MediaKind::Video {
        let thumb_path = state.storage.thumbnail_file_path(&stored);
        if !thumb_path.exists() {
            let input = state.storage.media_file_path(&stored);
            if let Err(e) = state.transcoder.video_thumbnail(&input, &thumb_path).await {
                warn!(filename = %stored, error = %e, "Thumbnail generation failed");
            }
        }
    }

    // Stage 4: sidecar metadata
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        state.metadata.set_description(&stored, description).await?;
    }
    if let Some(album) = album.filter(|a| !a.is_empty()) {
        state.metadata.set_album(&stored, album).await?;
    }

    Ok(stored)
}

/// Convert a freshly stored file and supersede the raw upload
///
/// On success the raw upload is removed so it cannot linger under a
/// misleading extension. On failure the raw upload is removed as well: the
/// item is reported as failed and must not surface in the listing.
async fn convert_stored(state: &AppState, stored: &str, target_ext: &str) -> Result<String> {
    let target = swap_extension(stored, target_ext);
    let input = state.storage.media_file_path(stored);
    let output = state.storage.media_file_path(&target);

    let result = match target_ext {
        "jpg" => state.transcoder.heic_to_jpeg(&input, &output).await,
        "mp4" => state.transcoder.mov_to_mp4(&input, &output).await,
        other => Err(AppError::internal(format!(
            "No conversion registered for target extension {:?}",
            other
        ))),
    };

    match result {
        Ok(()) => {
            state.storage.delete_media(stored).await?;
            info!(from = %stored, to = %target, "Converted upload");
            Ok(target)
        }
        Err(e) => {
            if let Err(cleanup) = state.storage.delete_media(stored).await {
                warn!(filename = %stored, error = %cleanup, "Failed to remove raw upload");
            }
            Err(e)
        }
    }
}

/// Replace a stored filename's extension
fn swap_extension(stored_filename: &str, target_ext: &str) -> String {
    let stem = stored_filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(stored_filename);
    format!("{}.{}", stem, target_ext)
}

/// Create upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/", post(upload_batch))
}
