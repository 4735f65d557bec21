//! Route handlers for the HTTP API.

pub mod auth;
pub mod folders;
pub mod health;
pub mod images;
pub mod items;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use pf_core::DeleteReport;

/// `?prefix=` query shared by the listing routes. Missing means the root.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PrefixQuery {
    /// Folder prefix, e.g. `portal/trips/`.
    pub prefix: Option<String>,
}

impl PrefixQuery {
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or_default()
    }
}

/// A delete report is a 200 when every id succeeded and a 500 otherwise;
/// the body is the full report either way.
pub(crate) fn report_response(report: DeleteReport) -> Response {
    let status = if report.has_failures() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(report)).into_response()
}
