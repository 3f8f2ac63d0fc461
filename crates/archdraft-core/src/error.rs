use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchdraftError {
    #[error("not initialized: run 'archdraft init'")]
    NotInitialized,

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("unknown column '{column}' for table '{table}'")]
    InvalidColumn { table: &'static str, column: String },

    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("background task failed: {0}")]
    Join(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ArchdraftError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchdraftError>;
