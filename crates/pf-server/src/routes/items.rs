//! Mixed folder/image selection delete.

use axum::extract::State;
use axum::response::Response;
use axum::Extension;
use serde::Deserialize;

use pf_core::{partition_ids, DeleteReport};

use super::report_response;
use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::auth::SessionContext;

/// Request body for deleting a mixed selection.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DeleteItemsRequest {
    /// Folder prefixes and image keys; ids with an image extension are
    /// treated as images, everything else as folders.
    pub ids: Vec<String>,
}

/// DELETE /api/items/delete
#[utoipa::path(
    delete,
    path = "/api/items/delete",
    request_body = DeleteItemsRequest,
    responses(
        (status = 200, description = "Every item deleted or already absent", body = DeleteReport),
        (status = 400, description = "Empty or invalid id list"),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Some items could not be deleted", body = DeleteReport)
    )
)]
pub async fn delete_items(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    ApiJson(payload): ApiJson<DeleteItemsRequest>,
) -> Result<Response, AppError> {
    if payload.ids.is_empty() {
        return Err(pf_core::Error::validation("no ids provided").into());
    }
    let (folder_ids, image_keys) = partition_ids(payload.ids);

    // Both halves are validated before anything is deleted.
    if !folder_ids.is_empty() {
        ctx.folders.check_ids(&folder_ids)?;
    }
    if !image_keys.is_empty() {
        ctx.images.check_keys(&image_keys)?;
    }

    let mut results = Vec::with_capacity(folder_ids.len() + image_keys.len());
    if !image_keys.is_empty() {
        results.extend(ctx.images.delete_images(&image_keys).await?.results);
    }
    if !folder_ids.is_empty() {
        results.extend(ctx.folders.delete_folders(&folder_ids).await?.results);
    }

    let report = DeleteReport::new("items", results);
    tracing::info!(
        actor = session.actor(),
        folders = folder_ids.len(),
        images = image_keys.len(),
        failed = report.has_failures(),
        "Selection delete via API"
    );
    Ok(report_response(report))
}
