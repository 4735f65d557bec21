//! Request extractors whose rejections use the API's JSON error body.
//!
//! Axum's own `Json` and `Multipart` reject with plain-text 4xx responses.
//! These wrappers turn every rejection into a [`pf_core::Error::Validation`].

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Request};

use crate::error::AppError;

/// JSON request body. Missing fields and malformed JSON become a 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        pf_core::Error::validation(format!("invalid JSON body: {}", rejection.body_text())).into()
    }
}

/// Multipart form body.
pub struct ApiMultipart(pub Multipart);

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        pf_core::Error::validation(format!("invalid multipart body: {}", rejection.body_text()))
            .into()
    }
}

impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Ok(Self(multipart))
    }
}
