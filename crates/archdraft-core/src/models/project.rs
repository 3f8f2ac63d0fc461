use super::text_or_empty;
use crate::controller::{self, int, text, Entity, NewEntity};
use crate::error::Result;
use gemini_agent::SpecField;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

/// A stored project specification. Nullable text columns read back as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub architecture: String,
    pub frontend_language: String,
    pub frontend_platform: String,
    pub frontend_library: String,
    pub backend_language: String,
    pub backend_platform: String,
    pub backend_library: String,
    pub user_id: i64,
}

impl Entity for Project {
    const NAME: &'static str = "project";
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "architecture",
        "frontend_language",
        "frontend_platform",
        "frontend_library",
        "backend_language",
        "backend_platform",
        "backend_library",
        "user_id",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: text_or_empty(row, "name")?,
            description: text_or_empty(row, "description")?,
            architecture: text_or_empty(row, "architecture")?,
            frontend_language: text_or_empty(row, "frontend_language")?,
            frontend_platform: text_or_empty(row, "frontend_platform")?,
            frontend_library: text_or_empty(row, "frontend_library")?,
            backend_language: text_or_empty(row, "backend_language")?,
            backend_platform: text_or_empty(row, "backend_platform")?,
            backend_library: text_or_empty(row, "backend_library")?,
            user_id: row.get("user_id")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Project {
    pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Self>> {
        controller::list(conn, &[("user_id", int(user_id))])
    }

    pub fn find_for_user(conn: &Connection, user_id: i64, name: &str) -> Result<Option<Self>> {
        controller::get_single(conn, &[("user_id", int(user_id)), ("name", text(name))])
    }

    /// The stored value of one regenerable field.
    pub fn field(&self, field: SpecField) -> &str {
        match field {
            SpecField::Description => &self.description,
            SpecField::Architecture => &self.architecture,
            SpecField::FrontendLanguage => &self.frontend_language,
            SpecField::FrontendPlatform => &self.frontend_platform,
            SpecField::FrontendLibrary => &self.frontend_library,
            SpecField::BackendLanguage => &self.backend_language,
            SpecField::BackendPlatform => &self.backend_platform,
            SpecField::BackendLibrary => &self.backend_library,
        }
    }
}

/// The editable part of a project: everything except `id` and owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFields {
    pub name: String,
    pub description: String,
    pub architecture: String,
    pub frontend_language: String,
    pub frontend_platform: String,
    pub frontend_library: String,
    pub backend_language: String,
    pub backend_platform: String,
    pub backend_library: String,
}

impl ProjectFields {
    pub fn set(&mut self, field: SpecField, value: String) {
        let slot = match field {
            SpecField::Description => &mut self.description,
            SpecField::Architecture => &mut self.architecture,
            SpecField::FrontendLanguage => &mut self.frontend_language,
            SpecField::FrontendPlatform => &mut self.frontend_platform,
            SpecField::FrontendLibrary => &mut self.frontend_library,
            SpecField::BackendLanguage => &mut self.backend_language,
            SpecField::BackendPlatform => &mut self.backend_platform,
            SpecField::BackendLibrary => &mut self.backend_library,
        };
        *slot = value;
    }

    /// Column/value pairs for an insert or a full update.
    pub fn changes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", text(&self.name)),
            ("description", text(&self.description)),
            ("architecture", text(&self.architecture)),
            ("frontend_language", text(&self.frontend_language)),
            ("frontend_platform", text(&self.frontend_platform)),
            ("frontend_library", text(&self.frontend_library)),
            ("backend_language", text(&self.backend_language)),
            ("backend_platform", text(&self.backend_platform)),
            ("backend_library", text(&self.backend_library)),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: i64,
    pub fields: ProjectFields,
}

impl NewProject {
    pub fn named(user_id: i64, name: &str) -> Self {
        Self {
            user_id,
            fields: ProjectFields {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }
}

impl NewEntity for NewProject {
    type Entity = Project;

    fn values(&self) -> Vec<(&'static str, Value)> {
        let mut values = self.fields.changes();
        values.push(("user_id", int(self.user_id)));
        values
    }
}
