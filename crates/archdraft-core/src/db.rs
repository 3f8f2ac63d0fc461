use crate::error::{ArchdraftError, Result};
use crate::schema;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite database file.
///
/// Holds only the path; every operation opens its own connection through
/// [`Db::connect`] and drops it when done.
#[derive(Debug, Clone)]
pub struct Db {
    path: PathBuf,
}

impl Db {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        crate::io::ensure_parent(&path)?;
        let db = Self { path };
        let conn = db.connect()?;
        schema::apply(&conn)?;
        tracing::debug!(path = %db.path.display(), "database ready");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh connection with foreign keys enforced.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    /// Run `f` with a fresh connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.connect()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| ArchdraftError::Join(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".archdraft/archdraft.db");
        let db = Db::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn connections_enforce_foreign_keys() {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("a.db")).unwrap();
        let conn = db.connect().unwrap();
        let on: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
        assert_eq!(on, 1);

        let err = conn.execute(
            "INSERT INTO projects (frontend_language, backend_language, user_id) VALUES ('', '', 99)",
            [],
        );
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn run_executes_on_blocking_pool() {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("a.db")).unwrap();
        let n: i64 = db
            .run(|conn| Ok(conn.query_row("SELECT 40 + 2", [], |r| r.get(0))?))
            .await
            .unwrap();
        assert_eq!(n, 42);
    }
}
