use archdraft_core::flow::project::parse_fields;
use archdraft_core::flow::{Generated, GridRow, ProjectSummary};
use archdraft_core::models::project::{Project, ProjectFields};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateBody {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// GET /api/projects: the current user's projects.
pub async fn list_projects(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<ProjectSummary>>, AppError> {
    let list = app.projects.list_user_projects(Some(&user.account)).await?;
    Ok(Json(list))
}

/// POST /api/projects: insert or update a project by name.
pub async fn save_project(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<ProjectFields>,
) -> Result<Json<serde_json::Value>, AppError> {
    let saved = app.projects.save_project(Some(&user.account), body).await?;
    if !saved {
        return Err(AppError::unauthorized("not logged in"));
    }
    Ok(Json(serde_json::json!({ "saved": true })))
}

/// POST /api/projects/generate: draft a project from its name.
pub async fn generate_project(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<Generated>, AppError> {
    let generated = app
        .projects
        .generate_project_data(Some(&user.account), &body.name)
        .await?;
    Ok(Json(generated))
}

/// POST /api/projects/regenerate: redraft selected fields only.
pub async fn regenerate_fields(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<RegenerateBody>,
) -> Result<Json<Vec<GridRow>>, AppError> {
    let fields = parse_fields(&body.fields)?;
    let rows = app
        .projects
        .regenerate_selected_fields(Some(&user.account), &body.name, &fields)
        .await?;
    Ok(Json(rows))
}

/// GET /api/projects/{id}: full project detail.
pub async fn get_project(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, AppError> {
    app.projects
        .owned_project(Some(&user.account), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("project not found: {id}")))
}

/// DELETE /api/projects/{id}: delete a project and everything under it.
pub async fn delete_project(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    if app.projects.owned_project(Some(&user.account), id).await?.is_none() {
        return Err(AppError::not_found(format!("project not found: {id}")));
    }
    app.projects.delete_project(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true, "id": id })))
}
