//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; any [`pf_core::Error`]
//! converts with `?`. Server-side failures are logged with their cause and
//! answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::middleware::request_id::current_request_id;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: pf_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: pf_core::Error) -> Self {
        Self {
            inner,
            request_id: current_request_id(),
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn inner(&self) -> &pf_core::Error {
        &self.inner
    }
}

impl From<pf_core::Error> for AppError {
    fn from(e: pf_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        } else {
            tracing::debug!(status = %status, error = %self.inner, "Request rejected");
        }

        let body = json!({
            "error": self.inner.public_message(),
            "code": self.inner.code(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn not_found_produces_404() {
        let err = AppError::new(pf_core::Error::not_found("folder", "portal/x/"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_produces_401() {
        let err = AppError::new(pf_core::Error::Unauthorized("bad token".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn with_request_id() {
        let err = AppError::new(pf_core::Error::Internal("oops".into()))
            .with_request_id("req-123".into());
        assert_eq!(err.request_id.as_deref(), Some("req-123"));
    }

    #[tokio::test]
    async fn storage_errors_hide_their_cause() {
        let err = AppError::new(pf_core::Error::storage("list", "AccessDenied: secret-bucket"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["code"], "storage_error");
        assert_eq!(json["error"], "Storage operation failed: list");
        assert!(!json.to_string().contains("secret-bucket"));
    }

    #[tokio::test]
    async fn validation_errors_keep_their_message() {
        let err = AppError::new(pf_core::Error::validation("folder name is required"));
        let json = body_json(err.into_response()).await;
        assert_eq!(json["code"], "validation_error");
        assert!(json["error"].as_str().unwrap().contains("folder name is required"));
    }
}
