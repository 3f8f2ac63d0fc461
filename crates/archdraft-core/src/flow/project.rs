use crate::controller;
use crate::db::Db;
use crate::error::{ArchdraftError, Result};
use crate::models::account::UserAccount;
use crate::models::project::{NewProject, Project, ProjectFields};
use gemini_agent::{ProjectAgent, ProjectDraft, SpecField};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROJECT_NAME_LABEL: &str = "Project name";

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// One `(label, content)` line of a drafted project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    /// Dotted reply path (`project_name`, `frontend.language`, ...).
    pub key: String,
    pub label: String,
    pub content: String,
}

impl GridRow {
    fn new(key: &str, label: &str, content: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            content: content.unwrap_or_default().to_string(),
        }
    }
}

/// Rows for the project name and every field, in display order. Only an
/// empty reply has no rows; fields it lacks show as `""`.
pub fn grid_rows(reply: &Map<String, Value>) -> Vec<GridRow> {
    if reply.is_empty() {
        return Vec::new();
    }
    let draft = ProjectDraft::from_reply(reply);
    let mut rows = vec![GridRow::new(
        "project_name",
        PROJECT_NAME_LABEL,
        draft.project_name.as_deref(),
    )];
    rows.extend(field_rows(&draft, SpecField::all()));
    rows
}

fn field_rows(draft: &ProjectDraft, fields: &[SpecField]) -> Vec<GridRow> {
    fields
        .iter()
        .map(|f| GridRow::new(f.path(), f.label(), draft.get(*f)))
        .collect()
}

/// Resolve field names given by path, key or label.
pub fn parse_fields<S: AsRef<str>>(names: &[S]) -> Result<Vec<SpecField>> {
    names
        .iter()
        .map(|n| {
            n.as_ref()
                .parse::<SpecField>()
                .map_err(|_| ArchdraftError::InvalidField(n.as_ref().to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub architecture: String,
}

impl From<Project> for ProjectSummary {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            architecture: p.architecture,
        }
    }
}

/// Result of a generate call: the rows to show and, when a user was
/// logged in and the model answered, the stored project.
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    pub rows: Vec<GridRow>,
    pub project_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// ProjectFlow
// ---------------------------------------------------------------------------

/// Ties the agent to the store on behalf of the current user, who is named
/// by account (`None` when nobody is logged in).
#[derive(Debug, Clone)]
pub struct ProjectFlow {
    db: Db,
    agent: ProjectAgent,
}

impl ProjectFlow {
    pub fn new(db: Db, agent: ProjectAgent) -> Self {
        Self { db, agent }
    }

    pub async fn current_user_id(&self, account: Option<&str>) -> Result<Option<i64>> {
        let Some(account) = account else {
            return Ok(None);
        };
        let account = account.to_string();
        let user = self
            .db
            .run(move |conn| UserAccount::find(conn, &account))
            .await?;
        Ok(user.map(|u| u.id))
    }

    /// Draft `project_name` with the agent and store the result for the
    /// current user when there is one.
    pub async fn generate_project_data(
        &self,
        account: Option<&str>,
        project_name: &str,
    ) -> Result<Generated> {
        let project_name = project_name.trim();
        if project_name.is_empty() {
            return Err(ArchdraftError::InvalidInput(
                "project name must not be empty".to_string(),
            ));
        }

        let reply = self.agent.generate_project_json(project_name).await;
        let rows = grid_rows(&reply);
        if rows.is_empty() {
            tracing::warn!(project = project_name, "agent returned nothing");
            return Ok(Generated {
                rows,
                project_id: None,
            });
        }

        let project_id = match self.current_user_id(account).await? {
            Some(user_id) => {
                let fields = fields_from_draft(&ProjectDraft::from_reply(&reply), project_name);
                let project = self
                    .db
                    .run(move |conn| upsert(conn, user_id, fields))
                    .await?;
                Some(project.id)
            }
            None => None,
        };
        Ok(Generated { rows, project_id })
    }

    /// Insert or update (by name, per user) a project. `false` when nobody
    /// is logged in.
    pub async fn save_project(&self, account: Option<&str>, data: ProjectFields) -> Result<bool> {
        let Some(user_id) = self.current_user_id(account).await? else {
            tracing::warn!("not logged in, project not saved");
            return Ok(false);
        };
        let fields = normalize(data);
        if fields.name.is_empty() {
            return Err(ArchdraftError::InvalidInput(
                "project name must not be empty".to_string(),
            ));
        }
        self.db.run(move |conn| upsert(conn, user_id, fields)).await?;
        Ok(true)
    }

    pub async fn list_user_projects(&self, account: Option<&str>) -> Result<Vec<ProjectSummary>> {
        let Some(user_id) = self.current_user_id(account).await? else {
            return Ok(Vec::new());
        };
        let projects = self
            .db
            .run(move |conn| Project::list_for_user(conn, user_id))
            .await?;
        Ok(projects.into_iter().map(ProjectSummary::from).collect())
    }

    pub async fn get_project_detail(&self, project_id: i64) -> Result<Option<Project>> {
        self.db
            .run(move |conn| controller::get::<Project>(conn, project_id))
            .await
    }

    /// The project, if it exists and belongs to `account`.
    pub async fn owned_project(
        &self,
        account: Option<&str>,
        project_id: i64,
    ) -> Result<Option<Project>> {
        let Some(user_id) = self.current_user_id(account).await? else {
            return Ok(None);
        };
        let project = self.get_project_detail(project_id).await?;
        Ok(project.filter(|p| p.user_id == user_id))
    }

    /// Delete a project and everything under it. `false` when missing.
    pub async fn delete_project(&self, project_id: i64) -> Result<bool> {
        let deleted = self
            .db
            .run(move |conn| controller::delete::<Project>(conn, project_id))
            .await?;
        if deleted {
            tracing::info!(project_id, "project deleted");
        }
        Ok(deleted)
    }

    /// Ask the agent for new values of `fields` only. When the current user
    /// owns a project called `project_name`, the non-empty new values are
    /// written to it.
    pub async fn regenerate_selected_fields(
        &self,
        account: Option<&str>,
        project_name: &str,
        fields: &[SpecField],
    ) -> Result<Vec<GridRow>> {
        if fields.is_empty() {
            return Err(ArchdraftError::InvalidInput(
                "select at least one field to regenerate".to_string(),
            ));
        }
        let project_name = project_name.trim();
        if project_name.is_empty() {
            return Err(ArchdraftError::InvalidInput(
                "project name must not be empty".to_string(),
            ));
        }

        let reply = self.agent.regenerate_fields(project_name, fields).await;
        if reply.is_empty() {
            tracing::warn!(project = project_name, "agent returned nothing");
            return Ok(Vec::new());
        }
        let draft = ProjectDraft::from_reply(&reply);
        let rows = field_rows(&draft, fields);

        let changes: Vec<(SpecField, String)> = fields
            .iter()
            .filter_map(|f| {
                draft
                    .get(*f)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (*f, v.to_string()))
            })
            .collect();
        if changes.is_empty() {
            return Ok(rows);
        }

        if let Some(user_id) = self.current_user_id(account).await? {
            let name = project_name.to_string();
            let updated = self
                .db
                .run(move |conn| {
                    let Some(project) = Project::find_for_user(conn, user_id, &name)? else {
                        return Ok(false);
                    };
                    let values: Vec<_> = changes
                        .iter()
                        .map(|(f, v)| (f.key(), controller::text(v)))
                        .collect();
                    controller::update::<Project>(conn, project.id, &values)?;
                    Ok(true)
                })
                .await?;
            if updated {
                tracing::info!(project = project_name, "regenerated fields saved");
            }
        }
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fields_from_draft(draft: &ProjectDraft, fallback_name: &str) -> ProjectFields {
    let mut fields = ProjectFields {
        name: draft
            .project_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(fallback_name)
            .to_string(),
        ..Default::default()
    };
    for f in SpecField::all() {
        fields.set(*f, draft.get(*f).unwrap_or_default().to_string());
    }
    normalize(fields)
}

/// Whitespace-only values become `""`.
fn normalize(mut fields: ProjectFields) -> ProjectFields {
    fn blank_to_empty(v: &mut String) {
        if v.trim().is_empty() {
            v.clear();
        }
    }
    blank_to_empty(&mut fields.name);
    blank_to_empty(&mut fields.description);
    blank_to_empty(&mut fields.architecture);
    blank_to_empty(&mut fields.frontend_language);
    blank_to_empty(&mut fields.frontend_platform);
    blank_to_empty(&mut fields.frontend_library);
    blank_to_empty(&mut fields.backend_language);
    blank_to_empty(&mut fields.backend_platform);
    blank_to_empty(&mut fields.backend_library);
    fields
}

fn upsert(conn: &Connection, user_id: i64, fields: ProjectFields) -> Result<Project> {
    match Project::find_for_user(conn, user_id, &fields.name)? {
        Some(existing) => {
            let project = controller::update::<Project>(conn, existing.id, &fields.changes())?
                .ok_or_else(|| ArchdraftError::not_found("project", existing.id))?;
            tracing::info!(project = %project.name, id = project.id, "project updated");
            Ok(project)
        }
        None => {
            let project = controller::add(conn, &NewProject { user_id, fields })?;
            tracing::info!(project = %project.name, id = project.id, "project created");
            Ok(project)
        }
    }
}
