use archdraft_core::flow::EventListDetail;
use archdraft_core::models::event::EventInput;
use archdraft_core::models::usecase::{Actor, Usecase, UsecaseFields};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActorBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EventListBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub events: Vec<EventInput>,
}

/// GET /api/projects/{id}/usecases
pub async fn list_usecases(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<Usecase>>, AppError> {
    let list = app.usecases.list_usecases(&user.account, project_id).await?;
    Ok(Json(list))
}

/// POST /api/projects/{id}/usecases
pub async fn create_usecase(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
    Json(body): Json<UsecaseFields>,
) -> Result<(StatusCode, Json<Usecase>), AppError> {
    let uc = app
        .usecases
        .create_usecase(&user.account, project_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(uc)))
}

/// GET /api/usecases/{id}
pub async fn get_usecase(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Usecase>, AppError> {
    Ok(Json(app.usecases.get_usecase(&user.account, id).await?))
}

/// PUT /api/usecases/{id}
pub async fn update_usecase(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<UsecaseFields>,
) -> Result<Json<Usecase>, AppError> {
    Ok(Json(app.usecases.update_usecase(&user.account, id, body).await?))
}

/// DELETE /api/usecases/{id}
pub async fn delete_usecase(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    app.usecases.delete_usecase(&user.account, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true, "id": id })))
}

/// GET /api/usecases/{id}/actors
pub async fn list_actors(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Actor>>, AppError> {
    Ok(Json(app.usecases.list_actors(&user.account, id).await?))
}

/// POST /api/usecases/{id}/actors
pub async fn attach_actor(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<ActorBody>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(
        app.usecases.attach_actor(&user.account, id, &body.name).await?,
    ))
}

/// DELETE /api/usecases/{id}/actors/{actor_id}
pub async fn detach_actor(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, actor_id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = app.usecases.detach_actor(&user.account, id, actor_id).await?;
    if !removed {
        return Err(AppError::not_found(format!(
            "actor {actor_id} is not linked to use case {id}"
        )));
    }
    Ok(Json(serde_json::json!({ "detached": true })))
}

/// GET /api/usecases/{id}/event-lists
pub async fn list_event_lists(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<EventListDetail>>, AppError> {
    Ok(Json(app.usecases.list_event_lists(&user.account, id).await?))
}

/// POST /api/usecases/{id}/event-lists
pub async fn create_event_list(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<EventListBody>,
) -> Result<(StatusCode, Json<EventListDetail>), AppError> {
    let detail = app
        .usecases
        .create_event_list(&user.account, id, &body.kind, body.events)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
