//! Generic CRUD over any table-backed [`Entity`].
//!
//! Filters and changes are `(column, value)` pairs. Values are always bound
//! as parameters; column names are checked against [`Entity::COLUMNS`]
//! before they reach the SQL text.

use crate::error::{ArchdraftError, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A row type with an integer `id` primary key.
pub trait Entity: Sized {
    /// Singular name used in "not found" errors.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Every column except `id`.
    const COLUMNS: &'static [&'static str];
    /// Column stamped with the current time on every update.
    const TOUCH_COLUMN: Option<&'static str> = None;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn id(&self) -> i64;
}

/// Insertable form of an [`Entity`].
pub trait NewEntity {
    type Entity: Entity;

    fn values(&self) -> Vec<(&'static str, Value)>;
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

pub type Filter<'a> = (&'a str, Value);

pub fn text(s: impl Into<String>) -> Value {
    Value::Text(s.into())
}

pub fn opt_text(s: Option<impl Into<String>>) -> Value {
    s.map_or(Value::Null, |s| Value::Text(s.into()))
}

pub fn int(n: i64) -> Value {
    Value::Integer(n)
}

/// Same text layout rusqlite writes for `DateTime<Utc>`, so rows read back
/// through `row.get::<_, DateTime<Utc>>` parse cleanly.
pub fn timestamp(at: DateTime<Utc>) -> Value {
    Value::Text(at.format("%F %T%.f%:z").to_string())
}

pub fn json(v: &serde_json::Value) -> Value {
    Value::Text(v.to_string())
}

fn column_list<T: Entity>() -> String {
    let mut cols = Vec::with_capacity(T::COLUMNS.len() + 1);
    cols.push("id");
    cols.extend_from_slice(T::COLUMNS);
    cols.join(", ")
}

fn check_column<T: Entity>(column: &str) -> Result<()> {
    if column == "id" || T::COLUMNS.iter().any(|c| *c == column) {
        Ok(())
    } else {
        Err(ArchdraftError::InvalidColumn {
            table: T::TABLE,
            column: column.to_string(),
        })
    }
}

fn where_clause<T: Entity>(filters: &[Filter<'_>]) -> Result<String> {
    if filters.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(filters.len());
    for (i, (col, _)) in filters.iter().enumerate() {
        check_column::<T>(col)?;
        parts.push(format!("{col} = ?{}", i + 1));
    }
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Insert `new` and return the stored row as read back from the table.
pub fn add<N: NewEntity>(conn: &Connection, new: &N) -> Result<N::Entity> {
    let values = new.values();
    for (col, _) in &values {
        check_column::<N::Entity>(col)?;
    }
    let cols: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        N::Entity::TABLE,
        cols.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, params_from_iter(values.into_iter().map(|(_, v)| v)))?;
    let id = conn.last_insert_rowid();
    tracing::debug!(table = N::Entity::TABLE, id, "row added");

    get::<N::Entity>(conn, id)?.ok_or_else(|| ArchdraftError::not_found(N::Entity::NAME, id))
}

pub fn get<T: Entity>(conn: &Connection, id: i64) -> Result<Option<T>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1",
        column_list::<T>(),
        T::TABLE
    );
    let row = conn.query_row(&sql, [id], |r| T::from_row(r)).optional()?;
    tracing::debug!(table = T::TABLE, id, found = row.is_some(), "row fetched");
    Ok(row)
}

/// First row (lowest id) matching every filter.
pub fn get_single<T: Entity>(conn: &Connection, filters: &[Filter<'_>]) -> Result<Option<T>> {
    let sql = format!(
        "SELECT {} FROM {}{} ORDER BY id LIMIT 1",
        column_list::<T>(),
        T::TABLE,
        where_clause::<T>(filters)?
    );
    let params = params_from_iter(filters.iter().map(|(_, v)| v));
    let row = conn.query_row(&sql, params, |r| T::from_row(r)).optional()?;
    tracing::debug!(table = T::TABLE, id = ?row.as_ref().map(Entity::id), "row matched");
    Ok(row)
}

/// Rows matching every filter, ordered by id. No filters lists the table.
pub fn list<T: Entity>(conn: &Connection, filters: &[Filter<'_>]) -> Result<Vec<T>> {
    let sql = format!(
        "SELECT {} FROM {}{} ORDER BY id",
        column_list::<T>(),
        T::TABLE,
        where_clause::<T>(filters)?
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.iter().map(|(_, v)| v)), |r| {
            T::from_row(r)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let ids: Vec<i64> = rows.iter().map(Entity::id).collect();
    tracing::debug!(table = T::TABLE, ?ids, "rows listed");
    Ok(rows)
}

/// Apply `changes` to row `id`. Columns the entity does not have are
/// skipped. Returns `None` when the row does not exist.
pub fn update<T: Entity>(conn: &Connection, id: i64, changes: &[Filter<'_>]) -> Result<Option<T>> {
    let mut sets = Vec::new();
    let mut values = Vec::new();
    for (col, val) in changes {
        let col: &str = col;
        if col == "id" || !T::COLUMNS.iter().any(|c| *c == col) || Some(col) == T::TOUCH_COLUMN {
            tracing::debug!(table = T::TABLE, column = col, "ignoring unknown column");
            continue;
        }
        values.push(val.clone());
        sets.push(format!("{col} = ?{}", values.len()));
    }
    if let Some(touch) = T::TOUCH_COLUMN {
        values.push(timestamp(Utc::now()));
        sets.push(format!("{touch} = ?{}", values.len()));
    }
    if sets.is_empty() {
        return get::<T>(conn, id);
    }

    values.push(Value::Integer(id));
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        T::TABLE,
        sets.join(", "),
        values.len()
    );
    let n = conn.execute(&sql, params_from_iter(values))?;
    if n == 0 {
        return Ok(None);
    }
    tracing::debug!(table = T::TABLE, id, "row updated");
    get::<T>(conn, id)
}

/// Delete row `id`; dependent rows go with it. `false` when missing.
pub fn delete<T: Entity>(conn: &Connection, id: i64) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
    let n = conn.execute(&sql, [id])?;
    if n > 0 {
        tracing::debug!(table = T::TABLE, id, "row deleted");
    }
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::{NewUserAccount, UserAccount};
    use crate::models::project::{NewProject, Project};
    use crate::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        schema::apply(&conn).unwrap();
        conn
    }

    fn account(conn: &Connection, name: &str) -> UserAccount {
        add(
            conn,
            &NewUserAccount {
                account: name.into(),
                password: "pw".into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn add_refreshes_row_with_id() {
        let conn = conn();
        let a = account(&conn, "alice");
        assert!(a.id > 0);
        assert_eq!(a.account, "alice");
    }

    #[test]
    fn get_missing_is_none() {
        let conn = conn();
        assert!(get::<UserAccount>(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn list_filters_and_orders_by_id() {
        let conn = conn();
        let a = account(&conn, "alice");
        let b = account(&conn, "bob");
        for (owner, name) in [(a.id, "p1"), (b.id, "p2"), (a.id, "p3")] {
            add(&conn, &NewProject::named(owner, name)).unwrap();
        }

        let all: Vec<Project> = list(&conn, &[]).unwrap();
        assert_eq!(all.len(), 3);

        let mine: Vec<Project> = list(&conn, &[("user_id", int(a.id))]).unwrap();
        let names: Vec<_> = mine.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["p1", "p3"]);
    }

    #[test]
    fn get_single_matches_all_filters() {
        let conn = conn();
        let a = account(&conn, "alice");
        let b = account(&conn, "bob");
        add(&conn, &NewProject::named(a.id, "shared")).unwrap();
        let theirs = add(&conn, &NewProject::named(b.id, "shared")).unwrap();

        let found: Project = get_single(
            &conn,
            &[("user_id", int(b.id)), ("name", text("shared"))],
        )
        .unwrap()
        .unwrap();
        assert_eq!(found.id, theirs.id);
    }

    #[test]
    fn unknown_filter_column_is_rejected() {
        let conn = conn();
        let err = list::<UserAccount>(&conn, &[("nickname", text("x"))]).unwrap_err();
        assert!(matches!(err, ArchdraftError::InvalidColumn { .. }));
    }

    #[test]
    fn update_ignores_unknown_columns() {
        let conn = conn();
        let a = account(&conn, "alice");
        let p = add(&conn, &NewProject::named(a.id, "p")).unwrap();

        let updated: Project = update(
            &conn,
            p.id,
            &[("description", text("new")), ("colour", text("red"))],
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.description, "new");
        assert_eq!(updated.name, "p");
    }

    #[test]
    fn update_missing_row_is_none() {
        let conn = conn();
        let r = update::<Project>(&conn, 7, &[("description", text("x"))]).unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let conn = conn();
        let a = account(&conn, "alice");
        assert!(delete::<UserAccount>(&conn, a.id).unwrap());
        assert!(!delete::<UserAccount>(&conn, a.id).unwrap());
    }

    /// Collects formatted log lines for one test.
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reads_log_the_rows_they_return() {
        let conn = conn();
        let a = account(&conn, "alice");
        let b = account(&conn, "bob");

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            get::<UserAccount>(&conn, a.id).unwrap();
            get_single::<UserAccount>(&conn, &[("account", text("bob"))]).unwrap();
            list::<UserAccount>(&conn, &[]).unwrap();
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("row fetched"), "{logs}");
        assert!(logs.contains(&format!("id=Some({})", b.id)), "{logs}");
        assert!(logs.contains(&format!("ids=[{}, {}]", a.id, b.id)), "{logs}");
    }

    #[test]
    fn deleting_account_cascades_to_projects() {
        let conn = conn();
        let a = account(&conn, "alice");
        add(&conn, &NewProject::named(a.id, "p")).unwrap();
        delete::<UserAccount>(&conn, a.id).unwrap();
        assert!(list::<Project>(&conn, &[]).unwrap().is_empty());
    }
}
