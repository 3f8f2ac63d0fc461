use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "archdraft_session";

/// Routes reachable without a session.
const PUBLIC_PATHS: &[&str] = &["/api/health", "/api/register", "/api/login"];

/// Account of the logged-in user, inserted into request extensions by
/// [`session_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account: String,
    pub token: String,
}

/// Axum middleware that requires a live session for every `/api/` route
/// except the public ones.
///
/// Evaluated in order:
/// 1. Path outside `/api/` or in [`PUBLIC_PATHS`] → passthrough
/// 2. Cookie `archdraft_session` names a live session → passthrough with
///    [`CurrentUser`] attached
/// 3. Otherwise → 401 JSON
pub async fn session_middleware(
    State(app): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api/") || PUBLIC_PATHS.iter().any(|p| *p == path) {
        return next.run(req).await;
    }

    if let Some(token) = session_token(req.headers()) {
        if let Some(account) = app.sessions.account(&token).await {
            req.extensions_mut().insert(CurrentUser { account, token });
            return next.run(req).await;
        }
    }

    Response::builder()
        .status(401)
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"error":"unauthorized"}"#))
        .expect("infallible: all header values are valid ASCII")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie").and_then(|v| v.to_str().ok())?;
    cookies
        .split(';')
        .find_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            (name == SESSION_COOKIE).then_some(value)
        })
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
