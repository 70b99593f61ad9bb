use axum::{
    Json,
    http::{StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Shown to rate-limited clients; the admin UI is Thai-first
const RATE_LIMIT_MESSAGE: &str = "กรุณารอสักครู่ก่อนลองใหม่ (Rate limit exceeded)";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Too Many Requests")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("Image path is required")]
    ImagePathRequired,

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::TooManyRequests { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(RETRY_AFTER, retry_after_secs.to_string())],
                Json(json!({
                    "success": false,
                    "error": "Too Many Requests",
                    "message": RATE_LIMIT_MESSAGE,
                    "retryAfter": retry_after_secs,
                })),
            )
                .into_response(),
            AppError::Storage(ref error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Failed to retrieve image",
                    "error": error,
                })),
            )
                .into_response(),
            AppError::ImagePathRequired | AppError::ImageNotFound(_) | AppError::NotFound(_) => {
                failure(StatusCode::NOT_FOUND, &self)
            }
            AppError::BadRequest(_) => failure(StatusCode::BAD_REQUEST, &self),
        }
    }
}

fn failure(status: StatusCode, error: &AppError) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "message": error.to_string(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn too_many_requests_shape() {
        let response = AppError::TooManyRequests { retry_after_secs: 42 }.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Too Many Requests");
        assert_eq!(body["message"], RATE_LIMIT_MESSAGE);
        assert_eq!(body["retryAfter"], 42);
    }

    #[tokio::test]
    async fn storage_error_is_500() {
        let response = AppError::Storage("connection reset".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Failed to retrieve image");
        assert_eq!(body["error"], "connection reset");
    }

    #[tokio::test]
    async fn missing_image_is_404() {
        let response = AppError::ImageNotFound("/uploads/a.png".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Image not found: /uploads/a.png");
    }
}
