pub mod account;
pub mod diagram;
pub mod event;
pub mod object;
pub mod project;
pub mod usecase;

use rusqlite::Row;

/// Read a nullable text column, rendering NULL as `""`.
pub(crate) fn text_or_empty(row: &Row<'_>, column: &str) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}
