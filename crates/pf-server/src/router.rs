//! Axum router construction.
//!
//! Builds the full application router with the read and write route
//! groups, middleware layers, API docs and optional static file serving.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::auth_status,
        routes::auth::get_session,
        routes::folders::get_folder,
        routes::folders::list_folders,
        routes::folders::breadcrumbs,
        routes::folders::create_folder,
        routes::folders::delete_folders,
        routes::images::list_images,
        routes::images::get_image,
        routes::images::create_image,
        routes::images::create_images,
        routes::images::delete_images,
        routes::items::delete_items,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::auth::LoginRequest,
        routes::auth::AuthResponse,
        routes::auth::AuthStatusResponse,
        routes::auth::SessionResponse,
        routes::folders::CreateFolderRequest,
        routes::folders::DeleteFoldersRequest,
        routes::images::DeleteImagesRequest,
        routes::images::UploadForm,
        routes::items::DeleteItemsRequest,
        pf_core::FolderData,
        pf_core::ImageData,
        pf_core::Breadcrumb,
        pf_core::DeleteReport,
        pf_core::DeleteOutcome,
        pf_core::DeleteStatus,
    ))
)]
struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Reads and auth routes -- always accessible.
    let open_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/status", get(routes::auth::auth_status))
        .route("/auth/session", get(routes::auth::get_session))
        .route("/folder", get(routes::folders::get_folder))
        .route("/folders", get(routes::folders::list_folders))
        .route("/breadcrumbs", get(routes::folders::breadcrumbs))
        .route("/images", get(routes::images::list_images))
        .route("/images/{*key}", get(routes::images::get_image));

    // Writes -- the auth middleware injects a SessionContext or rejects.
    let write_routes = Router::new()
        .route("/folders/create", post(routes::folders::create_folder))
        .route("/folders/delete", delete(routes::folders::delete_folders))
        .route("/images/create", post(routes::images::create_image))
        .route("/images/batch", post(routes::images::create_images))
        .route("/images/delete", delete(routes::images::delete_images))
        .route("/items/delete", delete(routes::items::delete_items))
        .layer(DefaultBodyLimit::max(ctx.config.upload.max_bytes))
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let api = open_routes.merge(write_routes);
    let static_dir = ctx.config.server.static_dir.clone();

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Static file serving for a built UI.
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                tower_http::services::ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(tower_http::services::ServeFile::new(index_path)),
            );
        } else {
            tracing::warn!("Static directory {:?} does not exist; not serving UI", dir);
        }
    }

    app
}
