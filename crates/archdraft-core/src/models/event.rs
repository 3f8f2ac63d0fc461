use super::text_or_empty;
use crate::controller::{self, int, opt_text, text, Entity, NewEntity};
use crate::error::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventList {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub use_case_id: i64,
}

impl Entity for EventList {
    const NAME: &'static str = "event list";
    const TABLE: &'static str = "event_lists";
    const COLUMNS: &'static [&'static str] = &["type", "use_case_id"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            kind: text_or_empty(row, "type")?,
            use_case_id: row.get("use_case_id")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl EventList {
    pub fn list_for_use_case(conn: &Connection, use_case_id: i64) -> Result<Vec<Self>> {
        controller::list(conn, &[("use_case_id", int(use_case_id))])
    }

    /// Events in this list, ordered by sequence number then id.
    pub fn events(&self, conn: &Connection) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = controller::list(conn, &[("event_list_id", int(self.id))])?;
        events.sort_by_key(|e| (e.sequence_no, e.id));
        Ok(events)
    }
}

#[derive(Debug, Clone)]
pub struct NewEventList {
    pub kind: String,
    pub use_case_id: i64,
}

impl NewEntity for NewEventList {
    type Entity = EventList;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![("type", text(&self.kind)), ("use_case_id", int(self.use_case_id))]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: i64,
    pub sequence_no: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub event_list_id: i64,
}

impl Entity for Event {
    const NAME: &'static str = "event";
    const TABLE: &'static str = "events";
    const COLUMNS: &'static [&'static str] = &["sequence_no", "type", "description", "event_list_id"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            sequence_no: row.get::<_, Option<i64>>("sequence_no")?.unwrap_or_default(),
            kind: text_or_empty(row, "type")?,
            description: text_or_empty(row, "description")?,
            event_list_id: row.get("event_list_id")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// One event as supplied by a client; the list id is filled in on insert.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventInput {
    pub sequence_no: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub sequence_no: i64,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub event_list_id: i64,
}

impl NewEntity for NewEvent {
    type Entity = Event;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("sequence_no", int(self.sequence_no)),
            ("type", opt_text(self.kind.clone())),
            ("description", opt_text(self.description.clone())),
            ("event_list_id", int(self.event_list_id)),
        ]
    }
}
