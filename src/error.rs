//! Error types for the tracker

use crate::types::Symbol;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(Symbol),

    #[error("Division by zero: percentage change from a zero base price")]
    DivisionByZero,

    #[error("Arithmetic overflow: {0}")]
    Overflow(&'static str),

    #[error("Notification failure on {sink}: {reason}")]
    NotificationFailure { sink: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Transport(format!("invalid payload: {}", err))
    }
}

impl From<config::ConfigError> for TrackerError {
    fn from(err: config::ConfigError) -> Self {
        TrackerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
