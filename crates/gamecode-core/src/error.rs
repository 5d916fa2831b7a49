use thiserror::Error;

/// Errors produced by the game code layer.
#[derive(Debug, Error)]
pub enum GamecodeError {
    #[error("invalid game code: {0}")]
    InvalidCode(String),

    #[error("room creation failed: {0}")]
    RoomCreation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type GamecodeResult<T> = Result<T, GamecodeError>;
