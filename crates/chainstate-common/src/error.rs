use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainStateError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChainStateError {
    pub fn status_code(&self) -> u16 {
        match self {
            ChainStateError::NotFound(_) => 404,
            ChainStateError::InvalidInput(_) => 400,
            ChainStateError::Database(_) | ChainStateError::Config(_) => 500,
        }
    }
}
