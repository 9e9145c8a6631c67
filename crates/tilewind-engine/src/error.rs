//! Library error types.

use crate::native::ErrorCode;

/// Errors raised while creating or configuring an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("an engine is already live on this Tilengine handle")]
    AlreadyInitialized,

    #[error("invalid engine args: {0}")]
    InvalidArgs(String),

    #[error("native call failed: {0}")]
    Native(ErrorCode),

    #[error("failed to parse engine config")]
    Config(#[from] toml::de::Error),

    #[error("failed to read engine config")]
    Io(#[from] std::io::Error),

    #[error("the native backend has already been claimed in this process")]
    BackendClaimed,
}

/// Errors raised by a window or its frame loop.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("window has no engine to draw")]
    NoEngine,

    #[error("failed to switch native context: {0}")]
    ContextSwitch(ErrorCode),

    #[error("failed to create native window: {0}")]
    CreateFailed(ErrorCode),

    #[error("draw failed {consecutive} frame(s) in a row: {code}")]
    DrawFailed { consecutive: u32, code: ErrorCode },

    #[error("window has been deleted")]
    Deleted,

    #[error(transparent)]
    Engine(#[from] EngineError),
}
