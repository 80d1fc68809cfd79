use thiserror::Error;

pub type Result<T> = std::result::Result<T, BattleLensError>;

#[derive(Error, Debug)]
pub enum BattleLensError {
    /// Upstream object store unreachable or returned a non-2xx status.
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Too many unparseable records in one snapshot.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl BattleLensError {
    pub fn unknown_dataset(key: &str) -> Self {
        BattleLensError::Config(format!("Unknown dataset: {key}"))
    }

    /// The message without the category prefix, for client-facing bodies.
    pub fn detail(&self) -> String {
        match self {
            BattleLensError::Fetch(m)
            | BattleLensError::Decompression(m)
            | BattleLensError::Parse(m)
            | BattleLensError::Validation(m)
            | BattleLensError::Config(m) => m.clone(),
            BattleLensError::Anyhow(e) => format!("{e:#}"),
        }
    }
}

