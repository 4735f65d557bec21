//! Image route handlers: list, stream, upload, delete.

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use pf_core::{DeleteReport, ImageData};
use pf_store::ImageUpload;

use super::{report_response, PrefixQuery};
use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiMultipart};
use crate::middleware::auth::SessionContext;

/// Path image URLs are served under.
pub const IMAGE_ROUTE: &str = "/api/images";

/// Images are immutable per key, so clients may cache them for a year.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Request body for deleting images.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImagesRequest {
    pub image_keys: Vec<String>,
}

/// Multipart upload form: one or more `file` parts plus `folderPath`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    folder_path: String,
}

struct ParsedUpload {
    folder_path: String,
    files: Vec<ImageUpload>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    pf_core::Error::validation(format!("invalid multipart body: {}", e.body_text())).into()
}

async fn read_upload(multipart: &mut Multipart) -> Result<ParsedUpload, AppError> {
    let mut parsed = ParsedUpload {
        folder_path: String::new(),
        files: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") | Some("files") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                parsed.files.push(ImageUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("folderPath") => {
                parsed.folder_path = field.text().await.map_err(multipart_error)?;
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(parsed)
}

/// GET /api/images
#[utoipa::path(
    get,
    path = "/api/images",
    params(PrefixQuery),
    responses(
        (status = 200, description = "Images directly under the prefix", body = Vec<ImageData>),
        (status = 400, description = "Prefix outside the root")
    )
)]
pub async fn list_images(
    State(ctx): State<AppContext>,
    Query(query): Query<PrefixQuery>,
) -> Result<Json<Vec<ImageData>>, AppError> {
    let images = ctx.images.list_images(query.prefix()).await?;
    Ok(Json(images))
}

/// GET /api/images/{key}
#[utoipa::path(
    get,
    path = "/api/images/{key}",
    params(("key" = String, Path, description = "Full object key, e.g. portal/trips/sunset.png")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 400, description = "Key outside the root"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn get_image(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let image = ctx.images.get_image(&key).await?;
    tracing::debug!(key = %image.key, size = image.size, "Streaming image");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        Body::from_stream(image.stream),
    )
        .into_response())
}

/// POST /api/images/create
#[utoipa::path(
    post,
    path = "/api/images/create",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image uploaded", body = ImageData),
        (status = 400, description = "Missing file or disallowed type"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn create_image(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    ApiMultipart(mut multipart): ApiMultipart,
) -> Result<impl IntoResponse, AppError> {
    let upload = read_upload(&mut multipart).await?;
    let Some(file) = upload.files.into_iter().next() else {
        return Err(pf_core::Error::validation("file is required").into());
    };

    let image = ctx.images.create_image(&upload.folder_path, file).await?;
    tracing::info!(actor = session.actor(), key = %image.id, "Image uploaded via API");
    Ok((StatusCode::CREATED, Json(image)))
}

/// POST /api/images/batch
#[utoipa::path(
    post,
    path = "/api/images/batch",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "All images uploaded", body = Vec<ImageData>),
        (status = 400, description = "Missing files or a disallowed type"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn create_images(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    ApiMultipart(mut multipart): ApiMultipart,
) -> Result<impl IntoResponse, AppError> {
    let upload = read_upload(&mut multipart).await?;
    let images = ctx
        .images
        .create_images(&upload.folder_path, upload.files)
        .await?;
    tracing::info!(actor = session.actor(), count = images.len(), "Images uploaded via API");
    Ok((StatusCode::CREATED, Json(images)))
}

/// DELETE /api/images/delete
#[utoipa::path(
    delete,
    path = "/api/images/delete",
    request_body = DeleteImagesRequest,
    responses(
        (status = 200, description = "All images deleted or already absent", body = DeleteReport),
        (status = 400, description = "Empty or invalid key list"),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Some images could not be deleted", body = DeleteReport)
    )
)]
pub async fn delete_images(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    ApiJson(payload): ApiJson<DeleteImagesRequest>,
) -> Result<Response, AppError> {
    let report = ctx.images.delete_images(&payload.image_keys).await?;
    tracing::info!(
        actor = session.actor(),
        images = payload.image_keys.len(),
        "Image delete via API"
    );
    Ok(report_response(report))
}
