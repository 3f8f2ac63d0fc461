use crate::controller;
use crate::db::Db;
use crate::error::Result;
use crate::models::account::{NewUserAccount, UserAccount};
use crate::password::{hash_password, verify_password};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// `{status, message}` shown to the user after a login or register attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub status: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Registered(UserAccount),
    MissingCredentials,
    AccountExists(String),
    Success(UserAccount),
    UnknownAccount,
    WrongPassword,
}

impl LoginOutcome {
    pub fn level(&self) -> NoticeLevel {
        match self {
            LoginOutcome::Registered(_) | LoginOutcome::Success(_) => NoticeLevel::Success,
            LoginOutcome::MissingCredentials | LoginOutcome::AccountExists(_) => {
                NoticeLevel::Warning
            }
            LoginOutcome::UnknownAccount | LoginOutcome::WrongPassword => NoticeLevel::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LoginOutcome::Registered(_) => "registered, please log in".to_string(),
            LoginOutcome::MissingCredentials => {
                "account or password must not be empty".to_string()
            }
            LoginOutcome::AccountExists(account) => {
                format!("account '{account}' already exists, choose another")
            }
            LoginOutcome::Success(user) => format!("welcome back, {}", user.account),
            LoginOutcome::UnknownAccount => "no such account".to_string(),
            LoginOutcome::WrongPassword => "wrong password".to_string(),
        }
    }

    pub fn notice(&self) -> Notice {
        Notice {
            status: self.level(),
            message: self.message(),
        }
    }

    /// The account a successful login or registration refers to.
    pub fn account(&self) -> Option<&UserAccount> {
        match self {
            LoginOutcome::Registered(user) | LoginOutcome::Success(user) => Some(user),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// LoginFlow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoginFlow {
    db: Db,
}

impl LoginFlow {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn register(&self, account: &str, password: &str) -> Result<LoginOutcome> {
        let account = account.trim().to_string();
        if account.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::MissingCredentials);
        }
        let password = hash_password(password);
        self.db
            .run(move |conn| {
                if UserAccount::find(conn, &account)?.is_some() {
                    return Ok(LoginOutcome::AccountExists(account));
                }
                let new = NewUserAccount {
                    account: account.clone(),
                    password,
                };
                match controller::add(conn, &new) {
                    Ok(user) => {
                        tracing::info!(account = %user.account, "account registered");
                        Ok(LoginOutcome::Registered(user))
                    }
                    Err(crate::ArchdraftError::Database(rusqlite::Error::SqliteFailure(e, _)))
                        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        Ok(LoginOutcome::AccountExists(account))
                    }
                    Err(e) => Err(e),
                }
            })
            .await
    }

    pub async fn login(&self, account: &str, password: &str) -> Result<LoginOutcome> {
        let account = account.trim().to_string();
        if account.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::MissingCredentials);
        }
        let user = self
            .db
            .run(move |conn| UserAccount::find(conn, &account))
            .await?;
        let outcome = match user {
            None => LoginOutcome::UnknownAccount,
            Some(user) if !verify_password(&user.password, password) => LoginOutcome::WrongPassword,
            Some(user) => {
                tracing::info!(account = %user.account, "login succeeded");
                LoginOutcome::Success(user)
            }
        };
        Ok(outcome)
    }

    /// Resolve an account name to its stored row.
    pub async fn account(&self, account: &str) -> Result<Option<UserAccount>> {
        let account = account.to_string();
        self.db.run(move |conn| UserAccount::find(conn, &account)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn flow() -> (TempDir, LoginFlow) {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("t.db")).unwrap();
        (dir, LoginFlow::new(db))
    }

    #[tokio::test]
    async fn register_then_login() {
        let (_dir, flow) = flow();
        let reg = flow.register("alice", "pw").await.unwrap();
        assert!(matches!(reg, LoginOutcome::Registered(_)));
        assert_eq!(reg.level(), NoticeLevel::Success);

        let login = flow.login("alice", "pw").await.unwrap();
        assert_eq!(login.account().map(|u| u.account.as_str()), Some("alice"));
        assert_eq!(login.message(), "welcome back, alice");
    }

    #[tokio::test]
    async fn blank_credentials_are_a_warning() {
        let (_dir, flow) = flow();
        for (a, p) in [("", "pw"), ("alice", ""), ("  ", "pw")] {
            let out = flow.register(a, p).await.unwrap();
            assert_eq!(out, LoginOutcome::MissingCredentials);
            assert_eq!(out.notice().status, NoticeLevel::Warning);
            assert_eq!(flow.login(a, p).await.unwrap(), LoginOutcome::MissingCredentials);
        }
    }

    #[tokio::test]
    async fn duplicate_account_is_rejected() {
        let (_dir, flow) = flow();
        flow.register("alice", "pw").await.unwrap();
        let again = flow.register("alice", "other").await.unwrap();
        assert_eq!(again, LoginOutcome::AccountExists("alice".into()));
        assert_eq!(again.level(), NoticeLevel::Warning);

        // the original password still works
        assert!(matches!(
            flow.login("alice", "pw").await.unwrap(),
            LoginOutcome::Success(_)
        ));
    }

    #[tokio::test]
    async fn unknown_account_and_wrong_password_are_errors() {
        let (_dir, flow) = flow();
        flow.register("alice", "pw").await.unwrap();

        let unknown = flow.login("bob", "pw").await.unwrap();
        assert_eq!(unknown, LoginOutcome::UnknownAccount);
        assert_eq!(unknown.level(), NoticeLevel::Error);

        let wrong = flow.login("alice", "nope").await.unwrap();
        assert_eq!(wrong, LoginOutcome::WrongPassword);
        assert_eq!(wrong.level(), NoticeLevel::Error);
    }

    #[tokio::test]
    async fn stored_password_field_is_returned_unchanged() {
        let (_dir, flow) = flow();
        let reg = flow.register("alice", "pw").await.unwrap();
        let stored = reg.account().unwrap().password.clone();
        assert!(stored.starts_with("sha256$"));

        let fetched = flow.account("alice").await.unwrap().unwrap();
        assert_eq!(fetched.password, stored);
        assert!(verify_password(&fetched.password, "pw"));
    }

    #[test]
    fn notice_serializes_lowercase_status() {
        let json = serde_json::to_value(LoginOutcome::WrongPassword.notice()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "wrong password");
    }
}
