//! Unfinished command sessions for two-step conversations with users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::update::{ChatId, UserId};

pub const MAX_ITEM_NAME_LENGTH: usize = 255;

/// A command waiting for the user's next text message to complete it.
///
/// At most one exists per (chat, user); storing a new one replaces the old.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommandSession {
    pub command: String,
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl PendingCommandSession {
    pub fn new(command: impl Into<String>, chat_id: ChatId, user_id: UserId) -> Self {
        Self {
            command: command.into(),
            chat_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// Reasons a shopping item name gets rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemNameError {
    Empty,
    TooLong,
}

/// Validates a shopping item name input
pub fn validate_item_name(name: &str) -> Result<String, ItemNameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ItemNameError::Empty);
    }

    if trimmed.chars().count() > MAX_ITEM_NAME_LENGTH {
        return Err(ItemNameError::TooLong);
    }

    Ok(trimmed.to_string())
}
