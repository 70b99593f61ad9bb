use std::sync::Arc;

use crate::cache::ImageCache;
use crate::content::ContentSnapshot;
use crate::image::{ImageNormalizer, ImageStore};
use crate::rate_limit::RateLimiter;

// app's shared state
pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
    pub normalizer: ImageNormalizer,
    pub image_store: Arc<dyn ImageStore>,
    pub image_cache: ImageCache,
    pub content: ContentSnapshot,
}
