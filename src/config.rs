use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::rate_limit::RateLimitConfig;

// CLI argument structure, every flag also readable from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "portfolio-gateway")]
#[command(about = "Rate-limited API gateway and image proxy for the portfolio site")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    // Frontend origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 100)]
    pub max_requests: u32,

    // Rate limit window in milliseconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_MS", default_value_t = 60_000)]
    pub window_ms: u64,

    // How often expired rate limit records are swept
    #[arg(long, env = "RATE_LIMIT_CLEANUP_INTERVAL_MS", default_value_t = 300_000)]
    pub cleanup_interval_ms: u64,

    // Local image storage root
    #[arg(long, env = "STORAGE_DIR", default_value = "./storage")]
    pub storage_dir: PathBuf,

    // Object storage base URL, takes precedence over storage_dir
    // Example: "https://bucket.sgp1.digitaloceanspaces.com"
    #[arg(long, env = "STORAGE_URL")]
    pub storage_url: Option<String>,

    // Image cache TTL in seconds, 0 disables the cache
    #[arg(long, env = "IMAGE_CACHE_TTL", default_value_t = 300)]
    pub image_cache_ttl: u64,

    // Most images held in the cache at once, 0 disables the cache
    #[arg(long, env = "IMAGE_CACHE_ENTRIES", default_value_t = 256)]
    pub image_cache_entries: usize,

    // Content snapshot served by the read routes
    #[arg(long, env = "CONTENT_FILE", default_value = "./content.json")]
    pub content_file: PathBuf,
}

impl Args {
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.max_requests,
            window: Duration::from_millis(self.window_ms),
            // a zero period would panic tokio's interval
            cleanup_interval: Duration::from_millis(self.cleanup_interval_ms.max(1)),
        }
    }

    pub fn image_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.image_cache_ttl)
    }

    // Origins the browser admin and public site may call from
    pub fn cors_origins(&self) -> Vec<String> {
        let mut origins = vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ];
        if !origins.contains(&self.frontend_url) {
            origins.push(self.frontend_url.clone());
        }
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["portfolio-gateway"]);
        let limits = args.rate_limit();

        assert_eq!(limits.max_requests, 100);
        assert_eq!(limits.window, Duration::from_secs(60));
        assert_eq!(limits.cleanup_interval, Duration::from_secs(300));
        assert_eq!(args.image_cache_ttl(), Duration::from_secs(300));
        assert_eq!(args.image_cache_entries, 256);
        assert!(args.storage_url.is_none());
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "portfolio-gateway",
            "--max-requests",
            "5",
            "--window-ms",
            "1000",
            "--storage-url",
            "https://bucket.example",
            "--frontend-url",
            "https://portfolio.example",
        ]);

        assert_eq!(args.rate_limit().max_requests, 5);
        assert_eq!(args.rate_limit().window, Duration::from_secs(1));
        assert_eq!(args.storage_url.as_deref(), Some("https://bucket.example"));
        assert_eq!(args.cors_origins().len(), 3);
    }
}
