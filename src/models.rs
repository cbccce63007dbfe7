//! Shopping list data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::update::{ChatId, UserId};

/// An item stored in a chat's shopping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: i64,
    pub name: String,
    pub chat_id: ChatId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// An item about to be added; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShoppingItem {
    pub name: String,
    pub chat_id: ChatId,
    pub created_by: UserId,
}
