//! Folder route handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use pf_core::{Breadcrumb, DeleteReport, FolderData, KeyPaths};

use super::{report_response, PrefixQuery};
use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::auth::SessionContext;

/// Request body for creating a folder.
///
/// Either `name` (with an optional `parentId`, default the root) or the
/// full folder path in `id`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub id: Option<String>,
}

impl CreateFolderRequest {
    /// Resolve the `(parent, name)` pair to create.
    fn target(&self, paths: &KeyPaths) -> Result<(String, String), pf_core::Error> {
        if let Some(name) = &self.name {
            let parent = self
                .parent_id
                .clone()
                .unwrap_or_else(|| paths.root().to_string());
            return Ok((parent, name.clone()));
        }

        let Some(id) = self.id.as_deref().filter(|id| !id.trim().is_empty()) else {
            return Err(pf_core::Error::validation("folder name is required"));
        };
        let Some(parent) = paths.parent_of(id) else {
            return Err(pf_core::Error::validation("the root folder already exists"));
        };
        Ok((parent, KeyPaths::name_of(id)))
    }
}

/// Request body for deleting folders.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFoldersRequest {
    pub folder_ids: Vec<String>,
}

/// GET /api/folder
#[utoipa::path(
    get,
    path = "/api/folder",
    params(PrefixQuery),
    responses(
        (status = 200, description = "Folder details", body = FolderData),
        (status = 400, description = "Prefix outside the root"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn get_folder(
    State(ctx): State<AppContext>,
    Query(query): Query<PrefixQuery>,
) -> Result<Json<FolderData>, AppError> {
    let folder = ctx.folders.get_folder(query.prefix()).await?;
    Ok(Json(folder))
}

/// GET /api/folders
#[utoipa::path(
    get,
    path = "/api/folders",
    params(PrefixQuery),
    responses(
        (status = 200, description = "Immediate child folders", body = Vec<FolderData>),
        (status = 400, description = "Prefix outside the root")
    )
)]
pub async fn list_folders(
    State(ctx): State<AppContext>,
    Query(query): Query<PrefixQuery>,
) -> Result<Json<Vec<FolderData>>, AppError> {
    let folders = ctx.folders.list_children(query.prefix()).await?;
    Ok(Json(folders))
}

/// GET /api/breadcrumbs
#[utoipa::path(
    get,
    path = "/api/breadcrumbs",
    params(PrefixQuery),
    responses(
        (status = 200, description = "Trail from the root to the prefix", body = Vec<Breadcrumb>),
        (status = 400, description = "Prefix outside the root")
    )
)]
pub async fn breadcrumbs(
    State(ctx): State<AppContext>,
    Query(query): Query<PrefixQuery>,
) -> Result<Json<Vec<Breadcrumb>>, AppError> {
    Ok(Json(ctx.folders.breadcrumbs(query.prefix())?))
}

/// POST /api/folders/create
#[utoipa::path(
    post,
    path = "/api/folders/create",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = FolderData),
        (status = 400, description = "Invalid folder name or parent"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn create_folder(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    ApiJson(payload): ApiJson<CreateFolderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (parent, name) = payload.target(&ctx.paths)?;
    let folder = ctx.folders.create_folder(&parent, &name).await?;
    tracing::info!(actor = session.actor(), folder = %folder.id, "Folder created via API");
    Ok((StatusCode::CREATED, Json(folder)))
}

/// DELETE /api/folders/delete
#[utoipa::path(
    delete,
    path = "/api/folders/delete",
    request_body = DeleteFoldersRequest,
    responses(
        (status = 200, description = "All folders deleted or already absent", body = DeleteReport),
        (status = 400, description = "Empty or invalid id list"),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Some folders could not be deleted", body = DeleteReport)
    )
)]
pub async fn delete_folders(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    ApiJson(payload): ApiJson<DeleteFoldersRequest>,
) -> Result<Response, AppError> {
    let report = ctx.folders.delete_folders(&payload.folder_ids).await?;
    tracing::info!(
        actor = session.actor(),
        folders = payload.folder_ids.len(),
        "Folder delete via API"
    );
    Ok(report_response(report))
}
