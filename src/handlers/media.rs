//! Per-item media operations.
//!
//! ## Endpoints
//!
//! - `GET /api/media` - The gallery listing
//! - `GET /api/media/{filename}` - Serve a stored file inline
//! - `GET /api/media/{filename}/download` - Serve as attachment
//! - `DELETE /api/media/{filename}` - Delete file, thumbnail, and metadata
//! - `PUT /api/media/{filename}/description` - Set or clear a description
//! - `PUT /api/media/{filename}/album` - Assign or clear an album label
//!
//! Mutations on a filename that does not exist report a `not_found`
//! outcome with HTTP 200 rather than an error; the sidecar files are left
//! untouched in that case.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, put},
    Json, Router,
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::handlers::gallery::list_media;
use crate::models::{AssignAlbumRequest, DescribeRequest, MutationOutcome, MutationResponse};
use crate::services::validator::ensure_safe_component;
use crate::state::AppState;

/// Serve a stored media file
///
/// GET /api/media/{filename}
async fn serve_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    stream_file(&state, &filename, false).await
}

/// Serve a stored media file as a download
///
/// GET /api/media/{filename}/download
///
/// Same bytes as the inline route, plus a `Content-Disposition: attachment`
/// header carrying the stored filename.
async fn download_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    stream_file(&state, &filename, true).await
}

async fn stream_file(state: &AppState, filename: &str, attachment: bool) -> Result<Response> {
    ensure_safe_component(filename)?;

    let path = state.storage.media_file_path(filename);
    if !path.exists() {
        return Err(AppError::not_found(format!("Media not found: {}", filename)));
    }

    let mime = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    let file = File::open(&path).await?;
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .header("X-Content-Type-Options", "nosniff");

    if attachment {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        );
    }

    let response = builder
        .body(body)
        .map_err(|e| AppError::internal(format!("Failed to build response: {}", e)))?;

    debug!(filename = %filename, attachment, "Served media file");

    Ok(response)
}

/// Delete a media item
///
/// DELETE /api/media/{filename}
///
/// Removes the stored file, its thumbnail if one exists, and both sidecar
/// entries. A missing filename yields the soft `not_found` outcome.
async fn delete_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<MutationResponse>> {
    ensure_safe_component(&filename)?;

    if !state.storage.delete_media(&filename).await? {
        return Ok(Json(MutationResponse {
            outcome: MutationOutcome::NotFound,
            filename,
        }));
    }

    state.storage.delete_thumbnail(&filename).await?;
    state.metadata.remove_entry(&filename).await?;

    info!(filename = %filename, "Deleted media item");

    Ok(Json(MutationResponse {
        outcome: MutationOutcome::Deleted,
        filename,
    }))
}

/// Set or clear an item's description
///
/// PUT /api/media/{filename}/description
async fn describe_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Json(request): Json<DescribeRequest>,
) -> Result<Json<MutationResponse>> {
    ensure_safe_component(&filename)?;

    if !state.storage.media_exists(&filename) {
        return Ok(Json(MutationResponse {
            outcome: MutationOutcome::NotFound,
            filename,
        }));
    }

    state
        .metadata
        .set_description(&filename, &request.description)
        .await?;

    info!(filename = %filename, "Updated description");

    Ok(Json(MutationResponse {
        outcome: MutationOutcome::Updated,
        filename,
    }))
}

/// Assign or clear an item's album label
///
/// PUT /api/media/{filename}/album
async fn assign_album(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Json(request): Json<AssignAlbumRequest>,
) -> Result<Json<MutationResponse>> {
    ensure_safe_component(&filename)?;

    if !state.storage.media_exists(&filename) {
        return Ok(Json(MutationResponse {
            outcome: MutationOutcome::NotFound,
            filename,
        }));
    }

    state.metadata.set_album(&filename, &request.album).await?;

    info!(filename = %filename, album = %request.album, "Assigned album");

    Ok(Json(MutationResponse {
        outcome: MutationOutcome::Updated,
        filename,
    }))
}

/// Create media routes
pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_media))
        .route("/{filename}", get(serve_media).delete(delete_media))
        .route("/{filename}/download", get(download_media))
        .route("/{filename}/description", put(describe_media))
        .route("/{filename}/album", put(assign_album))
}
