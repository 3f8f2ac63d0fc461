use super::text_or_empty;
use crate::controller::{self, int, json, opt_text, timestamp, Entity, NewEntity};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::Serialize;
use std::marker::PhantomData;

// ---------------------------------------------------------------------------
// Diagram kinds
// ---------------------------------------------------------------------------

/// The three diagram tables share one shape; a kind names the table and the
/// object link table that hangs off it.
pub trait DiagramKind: Send + Sync + 'static {
    const NAME: &'static str;
    const TABLE: &'static str;
    const LINK_TABLE: &'static str;
    /// Column in [`Self::LINK_TABLE`] that points back at the diagram.
    const LINK_COLUMN: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Class;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRelationship;

impl DiagramKind for Sequence {
    const NAME: &'static str = "sequence diagram";
    const TABLE: &'static str = "sequence_diagrams";
    const LINK_TABLE: &'static str = "sequence_objects";
    const LINK_COLUMN: &'static str = "sequence_diagram_id";
}

impl DiagramKind for Class {
    const NAME: &'static str = "class diagram";
    const TABLE: &'static str = "class_diagrams";
    const LINK_TABLE: &'static str = "class_objects";
    const LINK_COLUMN: &'static str = "class_diagram_id";
}

impl DiagramKind for EntityRelationship {
    const NAME: &'static str = "entity relationship diagram";
    const TABLE: &'static str = "entity_relationship_diagrams";
    const LINK_TABLE: &'static str = "entity_relationship_objects";
    const LINK_COLUMN: &'static str = "entity_relationship_diagram_id";
}

pub type SequenceDiagram = Diagram<Sequence>;
pub type ClassDiagram = Diagram<Class>;
pub type EntityRelationshipDiagram = Diagram<EntityRelationship>;

// ---------------------------------------------------------------------------
// Diagram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct Diagram<K: DiagramKind> {
    pub id: i64,
    pub description: String,
    pub mermaid_code: String,
    pub diagram_json: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub use_case_id: i64,
    #[serde(skip)]
    kind: PhantomData<K>,
}

impl<K: DiagramKind> Entity for Diagram<K> {
    const NAME: &'static str = K::NAME;
    const TABLE: &'static str = K::TABLE;
    const COLUMNS: &'static [&'static str] = &[
        "description",
        "mermaid_code",
        "diagram_json",
        "created_at",
        "updated_at",
        "use_case_id",
    ];
    const TOUCH_COLUMN: Option<&'static str> = Some("updated_at");

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            description: text_or_empty(row, "description")?,
            mermaid_code: text_or_empty(row, "mermaid_code")?,
            diagram_json: row.get("diagram_json")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            use_case_id: row.get("use_case_id")?,
            kind: PhantomData,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl<K: DiagramKind> Diagram<K> {
    pub fn list_for_use_case(conn: &Connection, use_case_id: i64) -> Result<Vec<Self>> {
        controller::list(conn, &[("use_case_id", int(use_case_id))])
    }
}

#[derive(Debug, Clone)]
pub struct NewDiagram<K: DiagramKind> {
    pub description: Option<String>,
    pub mermaid_code: Option<String>,
    pub diagram_json: Option<serde_json::Value>,
    pub use_case_id: i64,
    kind: PhantomData<K>,
}

impl<K: DiagramKind> NewDiagram<K> {
    pub fn new(use_case_id: i64) -> Self {
        Self {
            description: None,
            mermaid_code: None,
            diagram_json: None,
            use_case_id,
            kind: PhantomData,
        }
    }
}

impl<K: DiagramKind> NewEntity for NewDiagram<K> {
    type Entity = Diagram<K>;

    fn values(&self) -> Vec<(&'static str, Value)> {
        let now = timestamp(Utc::now());
        vec![
            ("description", opt_text(self.description.clone())),
            ("mermaid_code", opt_text(self.mermaid_code.clone())),
            ("diagram_json", self.diagram_json.as_ref().map_or(Value::Null, json)),
            ("created_at", now.clone()),
            ("updated_at", now),
            ("use_case_id", int(self.use_case_id)),
        ]
    }
}
