use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

// Registration only fails on duplicate names, which are fixed here
lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("portfolio_requests_total", "Total number of requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("portfolio_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref RATE_LIMIT_CLIENTS: Gauge =
        register_gauge!("portfolio_rate_limit_clients", "Client records held by the rate limiter").unwrap();
    pub static ref IMAGE_CACHE_HITS: Counter =
        register_counter!("portfolio_image_cache_hits_total", "Image proxy cache hits").unwrap();
    pub static ref IMAGE_CACHE_MISSES: Counter =
        register_counter!("portfolio_image_cache_misses_total", "Image proxy cache misses").unwrap();
    pub static ref IMAGE_FETCH_LATENCY: Histogram = register_histogram!(
        "portfolio_image_fetch_latency_seconds",
        "Image storage fetch latency in seconds"
    )
    .unwrap();
}
