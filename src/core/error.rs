use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfficeError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, OfficeError>;
