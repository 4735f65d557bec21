//! Authentication middleware for write routes.
//!
//! Resolves the caller from an `Authorization: Bearer` header or the session
//! cookie and injects a [`SessionContext`] into request extensions. When
//! auth is disabled every request gets an anonymous context. Read routes are
//! not wrapped by this middleware.

use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};

use crate::context::AppContext;
use crate::error::AppError;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "portalfs_session";

/// How the caller proved who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Auth is disabled; everyone is allowed.
    Disabled,
    /// The configured API key was presented.
    ApiKey,
    /// A login session token was presented.
    Session,
}

/// Identity of the caller for the current request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub method: AuthMethod,
    pub username: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self {
            method: AuthMethod::Disabled,
            username: None,
            expires_at: None,
        }
    }

    /// Name used in logs.
    pub fn actor(&self) -> &str {
        match (&self.method, &self.username) {
            (_, Some(name)) => name.as_str(),
            (AuthMethod::ApiKey, None) => "api-key",
            _ => "anonymous",
        }
    }
}

/// Pull a bearer token or session cookie from request headers.
///
/// The `Authorization` header wins over the cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

/// Resolve the caller for `headers`, or `None` if auth is enabled and no
/// valid credential was presented.
pub fn resolve_session(ctx: &AppContext, headers: &HeaderMap) -> Option<SessionContext> {
    if !ctx.config.auth.enabled {
        return Some(SessionContext::anonymous());
    }

    let token = extract_token(headers)?;

    if let Some(api_key) = ctx.config.auth.api_key.as_deref() {
        if !api_key.is_empty() && token == api_key {
            return Some(SessionContext {
                method: AuthMethod::ApiKey,
                username: None,
                expires_at: None,
            });
        }
    }

    ctx.sessions.get(&token).map(|session| SessionContext {
        method: AuthMethod::Session,
        username: Some(session.username),
        expires_at: Some(session.expires_at),
    })
}

/// Authentication middleware. Applied to write routes only.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    match resolve_session(&ctx, request.headers()) {
        Some(session) => {
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated write");
            Err(pf_core::Error::Unauthorized("Authentication required".into()).into())
        }
    }
}
