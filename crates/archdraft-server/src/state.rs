use archdraft_core::flow::{LoginFlow, ProjectFlow, UsecaseFlow};
use archdraft_core::{Config, Db};
use gemini_agent::ProjectAgent;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session token → account name. Lives only as long as the process.
#[derive(Clone, Default)]
pub struct Sessions(Arc<RwLock<HashMap<String, String>>>);

impl Sessions {
    /// Start a session for `account` and return its token. An account holds
    /// one session at a time; logging in again ends the previous one.
    pub async fn create(&self, account: &str) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut sessions = self.0.write().await;
        sessions.retain(|_, a| a != account);
        sessions.insert(token.clone(), account.to_string());
        token
    }

    pub async fn account(&self, token: &str) -> Option<String> {
        self.0.read().await.get(token).cloned()
    }

    pub async fn remove(&self, token: &str) -> Option<String> {
        self.0.write().await.remove(token)
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub login: LoginFlow,
    pub projects: ProjectFlow,
    pub usecases: UsecaseFlow,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(root: PathBuf, db: Db, agent: ProjectAgent) -> Self {
        Self {
            root,
            login: LoginFlow::new(db.clone()),
            projects: ProjectFlow::new(db.clone(), agent),
            usecases: UsecaseFlow::new(db),
            sessions: Sessions::default(),
        }
    }

    /// Load `archdraft.yaml` under `root` (defaults when absent), open the
    /// database and build the agent.
    pub fn open(root: &Path, api_key: Option<String>) -> anyhow::Result<Self> {
        let config = Config::load_or_default(root)?;
        for w in config.validate() {
            tracing::warn!(level = ?w.level, "{}", w.message);
        }
        let db = Db::open(config.database_path(root))?;
        let agent = ProjectAgent::new(config.agent.to_agent_config(api_key))?;
        Ok(Self::new(root.to_path_buf(), db, agent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_login_replaces_the_accounts_old_session() {
        let sessions = Sessions::default();
        let first = sessions.create("alice").await;
        let other = sessions.create("bob").await;
        let second = sessions.create("alice").await;

        assert!(sessions.account(&first).await.is_none());
        assert_eq!(sessions.account(&second).await.as_deref(), Some("alice"));
        assert_eq!(sessions.account(&other).await.as_deref(), Some("bob"));
        assert_eq!(sessions.0.read().await.len(), 2);
    }

    #[tokio::test]
    async fn sessions_round_trip() {
        let sessions = Sessions::default();
        let token = sessions.create("alice").await;
        assert_eq!(sessions.account(&token).await.as_deref(), Some("alice"));
        assert_eq!(sessions.remove(&token).await.as_deref(), Some("alice"));
        assert!(sessions.account(&token).await.is_none());
    }

    #[test]
    fn open_uses_defaults_without_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = AppState::open(dir.path(), None).unwrap();
        assert_eq!(state.root, dir.path());
        assert!(dir.path().join(".archdraft/archdraft.db").exists());
    }
}
