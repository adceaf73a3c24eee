//! Error types for the plan execution engine.

use thiserror::Error;

/// Fact store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Fact store connection error: {0}")]
    Connection(String),

    #[error("Fact store command failed: {0}")]
    Command(String),

    #[error("Fact store I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid fact data: {0}")]
    InvalidData(String),
}

/// Errors raised while invoking a single action
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("unknown executor kind: {0}")]
    UnknownKind(String),

    #[error("failed to build request: {0}")]
    BuildRequest(String),

    #[error("failed to execute request: {0}")]
    Transport(String),

    #[error("request failed with status: {0}")]
    Status(String),
}

/// Message transport errors (plan intake and replan publishing)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport connection error: {0}")]
    Connection(String),

    #[error("Transport command failed: {0}")]
    Command(String),

    #[error("Failed to serialize message: {0}")]
    Serialization(String),

    #[error("Channel closed: {0}")]
    Closed(String),
}

/// Inbound payload could not be decoded into a plan
#[derive(Debug, Error)]
#[error("Malformed plan payload: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Top-level engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Fact store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Action invocation error: {0}")]
    Invoke(#[from] InvokeError),

    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Command(format!("sled: {}", err))
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

impl From<redis::RedisError> for TransportError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Command(err.to_string())
        }
    }
}
