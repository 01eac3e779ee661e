use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Effect '{id}' not found")]
    EffectNotFound { id: String },

    #[error("Effect '{id}' has no component at index {index}")]
    ComponentOutOfRange { id: String, index: usize },

    #[error("Item '{id}' not found")]
    ItemNotFound { id: String },

    #[error("No room in inventory for '{item}'")]
    InventoryFull { item: String },

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Session '{key}' not found")]
    SessionNotFound { key: String },

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GameResult<T> = Result<T, GameError>;
