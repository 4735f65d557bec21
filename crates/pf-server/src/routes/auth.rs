//! Authentication route handlers: login, logout, status, session.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::auth::{extract_token, resolve_session, AuthMethod, SESSION_COOKIE};

/// Login request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login/logout response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Auth status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub auth_enabled: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// The caller's current session.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// `disabled`, `api_key` or `session`.
    pub method: String,
    pub username: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Check `password` against the configured bcrypt hash.
fn password_matches(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Configured password hash is unusable: {e}");
            false
        }
    }
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(ctx): State<AppContext>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_config = &ctx.config.auth;

    if !auth_config.enabled {
        return Ok((
            StatusCode::OK,
            AppendHeaders(Vec::<(header::HeaderName, String)>::new()),
            Json(AuthResponse {
                success: true,
                message: "Auth disabled".into(),
                token: None,
            }),
        ));
    }

    let valid = match (&auth_config.username, &auth_config.password_hash) {
        (Some(expected_user), Some(hash)) => {
            payload.username == *expected_user && password_matches(&payload.password, hash)
        }
        _ => false,
    };

    if !valid {
        tracing::warn!(username = %payload.username, "Failed login attempt");
        return Err(pf_core::Error::Unauthorized("Invalid credentials".into()).into());
    }

    let session = ctx.sessions.create(&payload.username);
    let cookie = session_cookie(&session.token, ctx.sessions.ttl().num_seconds());

    Ok((
        StatusCode::OK,
        AppendHeaders(vec![(header::SET_COOKIE, cookie)]),
        Json(AuthResponse {
            success: true,
            message: "Login successful".into(),
            token: Some(session.token),
        }),
    ))
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = AuthResponse)
    )
)]
pub async fn logout(State(ctx): State<AppContext>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = extract_token(&headers) {
        ctx.sessions.revoke(&token);
    }

    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie("", 0))],
        Json(AuthResponse {
            success: true,
            message: "Logged out".into(),
            token: None,
        }),
    )
}

/// GET /api/auth/status
#[utoipa::path(
    get,
    path = "/api/auth/status",
    responses(
        (status = 200, description = "Auth status", body = AuthStatusResponse)
    )
)]
pub async fn auth_status(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Json<AuthStatusResponse> {
    let session = resolve_session(&ctx, &headers);
    Json(AuthStatusResponse {
        auth_enabled: ctx.config.auth.enabled,
        authenticated: session.is_some(),
        username: session.and_then(|s| s.username),
    })
}

/// GET /api/auth/session
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session, or null", body = SessionResponse)
    )
)]
pub async fn get_session(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Json<Option<SessionResponse>> {
    let session = resolve_session(&ctx, &headers).map(|s| SessionResponse {
        method: match s.method {
            AuthMethod::Disabled => "disabled",
            AuthMethod::ApiKey => "api_key",
            AuthMethod::Session => "session",
        }
        .into(),
        username: s.username,
        expires_at: s.expires_at,
    });
    Json(session)
}
