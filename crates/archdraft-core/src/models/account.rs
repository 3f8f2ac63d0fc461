use crate::controller::{self, text, Entity, NewEntity};
use crate::error::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub account: String,
    /// Stored password field, as written.
    #[serde(skip_serializing)]
    pub password: String,
}

impl Entity for UserAccount {
    const NAME: &'static str = "account";
    const TABLE: &'static str = "user_accounts";
    const COLUMNS: &'static [&'static str] = &["account", "password"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            account: row.get("account")?,
            password: row.get("password")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl UserAccount {
    pub fn find(conn: &Connection, account: &str) -> Result<Option<Self>> {
        controller::get_single(conn, &[("account", text(account))])
    }
}

#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub account: String,
    pub password: String,
}

impl NewEntity for NewUserAccount {
    type Entity = UserAccount;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("account", text(&self.account)),
            ("password", text(&self.password)),
        ]
    }
}
