use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use url::Url;

use super::{API_IMAGE_PREFIX, ApiImageProxy, ImageRef, ProxyUrlBuilder};

lazy_static! {
    static ref UPLOADS_SEGMENT: Regex = Regex::new(r"/uploads/.*").unwrap();
    static ref PATH_BEFORE_QUERY: Regex = Regex::new(r"/[^?]*").unwrap();
}

/// Canonicalizes stored image references into proxy paths.
///
/// Applying it to its own output is a no-op, so values that were saved in
/// proxy form come back unchanged.
#[derive(Clone)]
pub struct ImageNormalizer {
    builder: Arc<dyn ProxyUrlBuilder>,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(ApiImageProxy))
    }
}

impl ImageNormalizer {
    pub fn new(builder: Arc<dyn ProxyUrlBuilder>) -> Self {
        Self { builder }
    }

    pub fn normalize(&self, image_ref: Option<&str>) -> Option<String> {
        let value = image_ref?;
        if value.is_empty() {
            return Some(String::new());
        }

        match ImageRef::classify(value) {
            ImageRef::Inline(data) => Some(data.to_string()),
            _ => Some(self.builder.proxy_url(&relative_path(value))),
        }
    }

    /// Rewrite an optional field of a response body.
    pub fn normalize_field(&self, field: &mut Option<String>) {
        if let Some(normalized) = self.normalize(field.as_deref()) {
            *field = Some(normalized);
        }
    }
}

/// Reduce a non-inline image reference to its storage-relative path.
pub fn relative_path(image_ref: &str) -> String {
    let mut path = match ImageRef::classify(image_ref) {
        ImageRef::Absolute(url) => url_path(url),
        other => other.as_str().to_string(),
    };

    if let Some(rest) = path.strip_prefix(API_IMAGE_PREFIX) {
        path = rest.to_string();
    }

    if path.starts_with("uploads/") {
        path.insert(0, '/');
    }

    path
}

fn url_path(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        Err(e) => {
            debug!(url = raw, error = %e, "unparseable image url, falling back to pattern match");
            UPLOADS_SEGMENT
                .find(raw)
                .or_else(|| PATH_BEFORE_QUERY.find(raw))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| raw.to_string())
        }
    }
}
