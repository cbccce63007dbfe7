//! # Error Types Module
//!
//! Errors produced while routing an update to a handler, plus the storage
//! and configuration errors surfaced by the collaborators.

use thiserror::Error;

/// How the error router should react to a failed dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The user sent something we can't handle: reply with help
    UnhandledInput,
    /// Something broke on our side: apologise and log for operators
    Internal,
}

/// Errors returned by the message and callback query routers
#[derive(Debug, Error)]
pub enum RoutingError {
    /// A bot command with no matching registry entry
    #[error("command /{0} is not supported")]
    UnsupportedCommand(String),
    /// The selected descriptor lacks the handler slot, or nothing is pending
    #[error("no handler found: {0}")]
    NoHandlerFound(String),
    /// Callback data doesn't parse as `command:payload`
    #[error(transparent)]
    MalformedCallbackData(#[from] MalformedCallbackData),
    /// The session tracker failed
    #[error("unable to {operation} an unfinished command (chat_id={chat_id}, user_id={user_id})")]
    Storage {
        operation: &'static str,
        chat_id: i64,
        user_id: i64,
        #[source]
        source: StorageError,
    },
    /// A concrete command or callback handler failed
    #[error("handler for /{command} failed")]
    Handler {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

impl RoutingError {
    /// Classify the error for the error router
    pub fn class(&self) -> ErrorClass {
        match self {
            RoutingError::UnsupportedCommand(_)
            | RoutingError::NoHandlerFound(_)
            | RoutingError::MalformedCallbackData(_) => ErrorClass::UnhandledInput,
            RoutingError::Storage { .. } | RoutingError::Handler { .. } => ErrorClass::Internal,
        }
    }
}

/// Callback data that isn't exactly one colon between two non-empty parts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("wrong callback data format for {data:?}: expected format is \"command:payload\"")]
pub struct MalformedCallbackData {
    pub data: String,
}

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors raised while reading the process configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
