use archdraft_core::flow::{LoginOutcome, Notice};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::{expired_cookie, session_cookie, CurrentUser};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub password: String,
}

fn outcome_status(outcome: &LoginOutcome) -> StatusCode {
    match outcome {
        LoginOutcome::Registered(_) => StatusCode::CREATED,
        LoginOutcome::Success(_) => StatusCode::OK,
        LoginOutcome::MissingCredentials => StatusCode::BAD_REQUEST,
        LoginOutcome::AccountExists(_) => StatusCode::CONFLICT,
        LoginOutcome::UnknownAccount | LoginOutcome::WrongPassword => StatusCode::UNAUTHORIZED,
    }
}

/// POST /api/register: create an account. Body is always `{status, message}`.
pub async fn register(
    State(app): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    let outcome = app.login.register(&body.account, &body.password).await?;
    Ok((outcome_status(&outcome), Json(outcome.notice())))
}

/// POST /api/login: check credentials and start a session.
pub async fn login(
    State(app): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Response, AppError> {
    let outcome = app.login.login(&body.account, &body.password).await?;
    let status = outcome_status(&outcome);
    let notice = Json(outcome.notice());

    let Some(user) = outcome.account() else {
        return Ok((status, notice).into_response());
    };
    let token = app.sessions.create(&user.account).await;
    Ok((status, [(header::SET_COOKIE, session_cookie(&token))], notice).into_response())
}

/// POST /api/logout: end the current session.
pub async fn logout(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    app.sessions.remove(&user.token).await;
    tracing::info!(account = %user.account, "logged out");
    (
        [(header::SET_COOKIE, expired_cookie())],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response()
}

/// GET /api/me: the logged-in account.
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "account": user.account }))
}
