use crate::error::Result;
use rusqlite::Connection;

pub const SCHEMA_VERSION: i64 = 1;

/// Every table, in dependency order. Cascades are declared on the foreign
/// keys so that deleting a parent row removes its dependents.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_accounts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    account     TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT,
    description         TEXT,
    architecture        TEXT,
    frontend_language   TEXT NOT NULL,
    frontend_platform   TEXT,
    frontend_library    TEXT,
    backend_language    TEXT NOT NULL,
    backend_platform    TEXT,
    backend_library     TEXT,
    user_id             INTEGER NOT NULL
        REFERENCES user_accounts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS use_cases (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT,
    description         TEXT,
    normal_process      TEXT,
    exception_process   TEXT,
    pre_condition       TEXT,
    post_condition      TEXT,
    trigger_condition   TEXT,
    project_id          INTEGER NOT NULL
        REFERENCES projects(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS actors (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT
);

CREATE TABLE IF NOT EXISTS usecase_actors (
    use_case_id INTEGER NOT NULL REFERENCES use_cases(id) ON DELETE CASCADE,
    actor_id    INTEGER NOT NULL REFERENCES actors(id) ON DELETE CASCADE,
    PRIMARY KEY (use_case_id, actor_id)
);

CREATE TABLE IF NOT EXISTS event_lists (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    type        TEXT,
    use_case_id INTEGER NOT NULL REFERENCES use_cases(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS events (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    sequence_no     INTEGER,
    type            TEXT,
    description     TEXT,
    event_list_id   INTEGER NOT NULL REFERENCES event_lists(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS sequence_diagrams (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    description     TEXT,
    mermaid_code    TEXT,
    diagram_json    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    use_case_id     INTEGER NOT NULL REFERENCES use_cases(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS class_diagrams (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    description     TEXT,
    mermaid_code    TEXT,
    diagram_json    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    use_case_id     INTEGER NOT NULL REFERENCES use_cases(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS entity_relationship_diagrams (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    description     TEXT,
    mermaid_code    TEXT,
    diagram_json    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    use_case_id     INTEGER NOT NULL REFERENCES use_cases(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS objects (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT,
    type    TEXT
);

CREATE TABLE IF NOT EXISTS sequence_objects (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    sequence_diagram_id INTEGER NOT NULL REFERENCES sequence_diagrams(id) ON DELETE CASCADE,
    object_id           INTEGER NOT NULL REFERENCES objects(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS class_objects (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    class_diagram_id    INTEGER NOT NULL REFERENCES class_diagrams(id) ON DELETE CASCADE,
    object_id           INTEGER NOT NULL REFERENCES objects(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS entity_relationship_objects (
    id                              INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_relationship_diagram_id  INTEGER NOT NULL
        REFERENCES entity_relationship_diagrams(id) ON DELETE CASCADE,
    object_id                       INTEGER NOT NULL REFERENCES objects(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS attributes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT,
    data_type   TEXT,
    visibility  TEXT,
    object_id   INTEGER NOT NULL REFERENCES objects(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS methods (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT,
    return_type TEXT,
    visibility  TEXT,
    parameters  TEXT,
    object_id   INTEGER NOT NULL REFERENCES objects(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id);
CREATE INDEX IF NOT EXISTS idx_use_cases_project ON use_cases(project_id);
CREATE INDEX IF NOT EXISTS idx_event_lists_use_case ON event_lists(use_case_id);
CREATE INDEX IF NOT EXISTS idx_events_event_list ON events(event_list_id);
"#;

/// Create any missing tables and stamp the schema version.
pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    let current: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if current < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        apply(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 16);

        let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0)).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
