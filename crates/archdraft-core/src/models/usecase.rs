use super::text_or_empty;
use crate::controller::{self, int, text, Entity, NewEntity};
use crate::error::Result;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Usecase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Usecase {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub normal_process: String,
    pub exception_process: String,
    pub pre_condition: String,
    pub post_condition: String,
    pub trigger_condition: String,
    pub project_id: i64,
}

impl Entity for Usecase {
    const NAME: &'static str = "use case";
    const TABLE: &'static str = "use_cases";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "normal_process",
        "exception_process",
        "pre_condition",
        "post_condition",
        "trigger_condition",
        "project_id",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: text_or_empty(row, "name")?,
            description: text_or_empty(row, "description")?,
            normal_process: text_or_empty(row, "normal_process")?,
            exception_process: text_or_empty(row, "exception_process")?,
            pre_condition: text_or_empty(row, "pre_condition")?,
            post_condition: text_or_empty(row, "post_condition")?,
            trigger_condition: text_or_empty(row, "trigger_condition")?,
            project_id: row.get("project_id")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Usecase {
    pub fn list_for_project(conn: &Connection, project_id: i64) -> Result<Vec<Self>> {
        controller::list(conn, &[("project_id", int(project_id))])
    }
}

/// Client-supplied use case text. On update, only `Some` fields change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UsecaseFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub normal_process: Option<String>,
    pub exception_process: Option<String>,
    pub pre_condition: Option<String>,
    pub post_condition: Option<String>,
    pub trigger_condition: Option<String>,
}

impl UsecaseFields {
    pub fn changes(&self) -> Vec<(&'static str, Value)> {
        [
            ("name", &self.name),
            ("description", &self.description),
            ("normal_process", &self.normal_process),
            ("exception_process", &self.exception_process),
            ("pre_condition", &self.pre_condition),
            ("post_condition", &self.post_condition),
            ("trigger_condition", &self.trigger_condition),
        ]
        .into_iter()
        .filter_map(|(col, v)| v.as_ref().map(|v| (col, text(v))))
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewUsecase {
    pub project_id: i64,
    pub fields: UsecaseFields,
}

impl NewEntity for NewUsecase {
    type Entity = Usecase;

    fn values(&self) -> Vec<(&'static str, Value)> {
        let mut values = self.fields.changes();
        values.push(("project_id", int(self.project_id)));
        values
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
}

impl Entity for Actor {
    const NAME: &'static str = "actor";
    const TABLE: &'static str = "actors";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: text_or_empty(row, "name")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Actor {
    /// The actor called `name`, created if it does not exist yet.
    pub fn find_or_create(conn: &Connection, name: &str) -> Result<Self> {
        if let Some(actor) = controller::get_single(conn, &[("name", text(name))])? {
            return Ok(actor);
        }
        controller::add(conn, &NewActor { name: name.to_string() })
    }
}

#[derive(Debug, Clone)]
pub struct NewActor {
    pub name: String,
}

impl NewEntity for NewActor {
    type Entity = Actor;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![("name", text(&self.name))]
    }
}

// ---------------------------------------------------------------------------
// UsecaseActor (composite key)
// ---------------------------------------------------------------------------

/// Link rows between use cases and actors. Keyed by the pair, so these
/// helpers stand in for the id-based controller operations.
pub struct UsecaseActor;

impl UsecaseActor {
    pub const TABLE: &'static str = "usecase_actors";

    /// Link `actor_id` to `use_case_id`. Returns `false` if already linked.
    pub fn link(conn: &Connection, use_case_id: i64, actor_id: i64) -> Result<bool> {
        let n = conn.execute(
            "INSERT OR IGNORE INTO usecase_actors (use_case_id, actor_id) VALUES (?1, ?2)",
            params![use_case_id, actor_id],
        )?;
        if n > 0 {
            tracing::debug!(use_case_id, actor_id, "actor linked");
        }
        Ok(n > 0)
    }

    pub fn unlink(conn: &Connection, use_case_id: i64, actor_id: i64) -> Result<bool> {
        let n = conn.execute(
            "DELETE FROM usecase_actors WHERE use_case_id = ?1 AND actor_id = ?2",
            params![use_case_id, actor_id],
        )?;
        if n > 0 {
            tracing::debug!(use_case_id, actor_id, "actor unlinked");
        }
        Ok(n > 0)
    }

    /// Actors linked to a use case, ordered by actor id.
    pub fn actors(conn: &Connection, use_case_id: i64) -> Result<Vec<Actor>> {
        let mut stmt = conn.prepare(
            "SELECT a.id, a.name FROM actors a \
             JOIN usecase_actors ua ON ua.actor_id = a.id \
             WHERE ua.use_case_id = ?1 ORDER BY a.id",
        )?;
        let rows = stmt
            .query_map([use_case_id], |r| Actor::from_row(r))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
