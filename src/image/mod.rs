//! Image references and the storage proxy behind `/api/images`.
//!
//! Stored image values come in four shapes, depending on when and how they
//! were saved. The normalizer turns all of them into the proxy path the
//! frontend requests; the proxy endpoint resolves those paths against object
//! storage.

mod normalize;
mod proxy;
mod store;

pub use normalize::{ImageNormalizer, relative_path};
pub use proxy::{API_IMAGE_PREFIX, ApiImageProxy, ProxyUrlBuilder};
pub use store::{HttpImageStore, ImageStore, LocalImageStore, StoredImage, guess_content_type};

const INLINE_DATA_PREFIX: &str = "data:";

/// The shape of a stored image value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRef<'a> {
    /// `data:` URI, never treated as a path.
    Inline(&'a str),
    /// Full `http(s)://` URL, typically to the storage bucket.
    Absolute(&'a str),
    /// Already routed through the proxy, `/api/images/...`.
    Proxied(&'a str),
    /// Bare storage key such as `uploads/widget/x.png`.
    Relative(&'a str),
}

impl<'a> ImageRef<'a> {
    pub fn classify(value: &'a str) -> Self {
        if value.starts_with(INLINE_DATA_PREFIX) {
            ImageRef::Inline(value)
        } else if value.starts_with("http://") || value.starts_with("https://") {
            ImageRef::Absolute(value)
        } else if value.starts_with(API_IMAGE_PREFIX) {
            ImageRef::Proxied(value)
        } else {
            ImageRef::Relative(value)
        }
    }

    pub fn as_str(&self) -> &'a str {
        match *self {
            ImageRef::Inline(s) | ImageRef::Absolute(s) | ImageRef::Proxied(s) | ImageRef::Relative(s) => s,
        }
    }
}
