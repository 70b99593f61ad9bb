use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use portfolio_gateway::build_router;
use portfolio_gateway::cache::ImageCache;
use portfolio_gateway::content::ContentSnapshot;
use portfolio_gateway::image::{ImageNormalizer, LocalImageStore};
use portfolio_gateway::rate_limit::{RateLimitConfig, RateLimiter};
use portfolio_gateway::state::AppState;

struct TestApp {
    router: Router,
    storage: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage);
    }
}

fn content() -> ContentSnapshot {
    serde_json::from_value(json!({
        "profile": {
            "name": "Test Person",
            "heroImage": "https://bucket.example/uploads/profile/hero.jpg",
            "portfolio": [
                { "id": 1, "title": "Game", "image": "/api/images/uploads/portfolio/game.png" }
            ]
        },
        "layouts": [{
            "id": 7,
            "name": "Default Layout",
            "isActive": true,
            "widgets": [
                { "id": 2, "type": "about", "order": 1, "isVisible": false },
                { "id": 1, "type": "hero", "order": 0, "imageUrl": "uploads/widget/hero.png" }
            ]
        }]
    }))
    .unwrap()
}

fn test_app(max_requests: u32) -> TestApp {
    test_app_with(max_requests, content())
}

fn test_app_with(max_requests: u32, content: ContentSnapshot) -> TestApp {
    let storage = std::env::temp_dir().join(format!("portfolio-gateway-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(storage.join("uploads/portfolio")).unwrap();
    std::fs::write(storage.join("uploads/portfolio/game.png"), b"\x89PNG fake").unwrap();

    let state = Arc::new(AppState {
        rate_limiter: Arc::new(RateLimiter::in_memory(RateLimitConfig {
            max_requests,
            ..RateLimitConfig::default()
        })),
        normalizer: ImageNormalizer::default(),
        image_store: Arc::new(LocalImageStore::new(&storage)),
        image_cache: ImageCache::new(Duration::from_secs(60), 64),
        content,
    });

    TestApp {
        router: build_router(state, CorsLayer::new()),
        storage,
    }
}

fn get(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = test_app(100);
    let response = app.router.clone().oneshot(get("/health", "1.1.1.1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn serves_image_with_cache_headers() {
    let app = test_app(100);
    let response = app
        .router
        .clone()
        .oneshot(get("/api/images/uploads/portfolio/game.png", "1.1.1.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(
        response.headers()["cache-control"],
        "public, max-age=31536000, immutable"
    );
    assert_eq!(response.headers()["content-length"], "9");
    let etag = response.headers()["etag"].to_str().unwrap().to_string();
    assert!(response.headers().contains_key("x-ratelimit-limit"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"\x89PNG fake");

    let revalidate = Request::builder()
        .uri("/api/images/uploads/portfolio/game.png")
        .header("x-forwarded-for", "1.1.1.1")
        .header("if-none-match", etag)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(revalidate).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn image_path_required() {
    let app = test_app(100);

    for uri in ["/api/images", "/api/images/"] {
        let response = app.router.clone().oneshot(get(uri, "1.1.1.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_json(response).await["message"], "Image path is required");
    }
}

#[tokio::test]
async fn missing_and_traversal_paths_are_not_found() {
    let app = test_app(100);

    let missing = app
        .router
        .clone()
        .oneshot(get("/api/images/uploads/portfolio/none.png", "1.1.1.1"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(missing).await["message"],
        "Image not found: /uploads/portfolio/none.png"
    );

    let traversal = app
        .router
        .clone()
        .oneshot(get("/api/images/uploads/../../etc/passwd", "1.1.1.1"))
        .await
        .unwrap();
    assert_eq!(traversal.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_images_are_proxy_paths() {
    let app = test_app(100);
    let response = app.router.clone().oneshot(get("/api/profile", "1.1.1.1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Test Person");
    assert_eq!(body["heroImage"], "/api/images/uploads/profile/hero.jpg");
    assert_eq!(body["portfolio"][0]["image"], "/api/images/uploads/portfolio/game.png");
}

#[tokio::test]
async fn layout_hides_invisible_widgets_by_default() {
    let app = test_app(100);

    let response = app.router.clone().oneshot(get("/api/layout", "1.1.1.1")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["widgets"].as_array().unwrap().len(), 1);
    assert_eq!(body["widgets"][0]["imageUrl"], "/api/images/uploads/widget/hero.png");

    let response = app
        .router
        .clone()
        .oneshot(get("/api/layout?includeHidden=true", "1.1.1.1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["widgets"][0]["type"], "hero");
    assert_eq!(body["widgets"][1]["type"], "about");
}

#[tokio::test]
async fn include_hidden_only_accepts_true() {
    let app = test_app(100);

    for uri in ["/api/layout?includeHidden=1", "/api/layout?includeHidden=yes", "/api/layout?includeHidden="] {
        let response = app.router.clone().oneshot(get(uri, "1.1.1.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["widgets"].as_array().unwrap().len(), 1, "{uri}");
    }
}

#[tokio::test]
async fn empty_content_serves_default_layout() {
    let app = test_app_with(100, ContentSnapshot::default());

    let response = app.router.clone().oneshot(get("/api/layout", "1.1.1.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "Default Layout");
    assert_eq!(body["isActive"], true);
    let widgets = body["widgets"].as_array().unwrap();
    assert_eq!(widgets.len(), 5);
    assert_eq!(widgets[0]["type"], "hero");
    assert_eq!(widgets[4]["type"], "contact");
    assert_eq!(widgets[4]["order"], 4);

    let profile = app.router.clone().oneshot(get("/api/profile", "1.1.1.1")).await.unwrap();
    assert_eq!(profile.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn widgets_require_numeric_layout_id() {
    let app = test_app(100);

    let ok = app.router.clone().oneshot(get("/api/widgets?layoutId=7", "1.1.1.1")).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_json(ok).await.as_array().unwrap().len(), 2);

    let bad = app.router.clone().oneshot(get("/api/widgets?layoutId=abc", "1.1.1.1")).await.unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let unknown = app.router.clone().oneshot(get("/api/widgets?layoutId=99", "1.1.1.1")).await.unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn over_limit_gets_429_json() {
    let app = test_app(2);

    for _ in 0..2 {
        let response = app.router.clone().oneshot(get("/health", "1.2.3.4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.router.clone().oneshot(get("/health", "1.2.3.4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()["retry-after"].to_str().unwrap().parse().unwrap();
    assert!(retry_after > 0 && retry_after <= 60);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Too Many Requests");
    assert_eq!(body["retryAfter"], retry_after);
}

#[tokio::test]
async fn anonymous_clients_share_one_bucket() {
    let app = test_app(2);
    let anonymous = || Request::builder().uri("/health").body(Body::empty()).unwrap();

    assert_eq!(app.router.clone().oneshot(anonymous()).await.unwrap().status(), StatusCode::OK);
    assert_eq!(app.router.clone().oneshot(anonymous()).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        app.router.clone().oneshot(anonymous()).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // an identified client is unaffected
    let response = app.router.clone().oneshot(get("/health", "9.9.9.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
