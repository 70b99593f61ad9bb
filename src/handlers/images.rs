use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{
        HeaderMap, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
    },
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::cache::CacheEntry;
use crate::error::AppError;
use crate::metrics::{IMAGE_CACHE_HITS, IMAGE_CACHE_MISSES, IMAGE_FETCH_LATENCY};
use crate::state::AppState;

// Stored objects never change under the same key
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// GET /api/images/{*path}
///
/// Serves a stored image by its storage-relative path, e.g.
/// `/api/images/uploads/portfolio/a.jpg` reads `/uploads/portfolio/a.jpg`.
pub async fn image_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::ImagePathRequired);
    }

    let storage_path = format!("/{trimmed}");
    if storage_path.contains('\0') || storage_path.split('/').any(|segment| segment == "..") {
        return Err(AppError::ImageNotFound(storage_path));
    }

    let entry = match state.image_cache.get(&storage_path) {
        Some(entry) => {
            IMAGE_CACHE_HITS.inc();
            debug!(path = %storage_path, "image cache hit");
            entry
        }
        None => {
            IMAGE_CACHE_MISSES.inc();
            let start = Instant::now();
            let image = state.image_store.fetch(&storage_path).await?;
            IMAGE_FETCH_LATENCY.observe(start.elapsed().as_secs_f64());
            debug!(
                path = %storage_path,
                store = state.image_store.scheme(),
                size = image.body.len(),
                "image fetched"
            );
            state.image_cache.insert(&storage_path, image)
        }
    };

    Ok(image_response(&entry, &headers))
}

/// GET /api/images without a path.
pub async fn image_path_required() -> AppError {
    AppError::ImagePathRequired
}

fn image_response(entry: &CacheEntry, request_headers: &HeaderMap) -> Response {
    let not_modified = request_headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|tags| tags.split(',').any(|tag| tag.trim() == entry.etag));

    if not_modified {
        return (
            StatusCode::NOT_MODIFIED,
            [(ETAG, entry.etag.clone()), (CACHE_CONTROL, IMMUTABLE.to_string())],
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, entry.image.content_type.clone()),
            (CACHE_CONTROL, IMMUTABLE.to_string()),
            (CONTENT_LENGTH, entry.image.body.len().to_string()),
            (ETAG, entry.etag.clone()),
        ],
        entry.image.body.clone(),
    )
        .into_response()
}
