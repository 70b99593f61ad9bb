/// Route prefix of the image proxy endpoint.
pub const API_IMAGE_PREFIX: &str = "/api/images";

/// Turns a storage-relative path into the path clients request.
pub trait ProxyUrlBuilder: Send + Sync {
    fn proxy_url(&self, relative_path: &str) -> String;
}

// Serves images through this gateway's own /api/images route
#[derive(Debug, Clone, Default)]
pub struct ApiImageProxy;

impl ProxyUrlBuilder for ApiImageProxy {
    fn proxy_url(&self, relative_path: &str) -> String {
        format!("{API_IMAGE_PREFIX}/{}", relative_path.trim_start_matches('/'))
    }
}
