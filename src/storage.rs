//! Storage interfaces used by the router and the command handlers.
//!
//! `SessionTracker` is the only mutable state the router touches. It is
//! injected once per process and must tolerate concurrent get/put/delete
//! on the same key: the router applies no locking of its own.

use async_trait::async_trait;

use crate::dialogue::PendingCommandSession;
use crate::errors::StorageError;
use crate::models::{NewShoppingItem, ShoppingItem};
use crate::update::{ChatId, UserId};

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait SessionTracker: Send + Sync {
    /// The pending session for (chat, user), if any
    async fn get_session(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> StorageResult<Option<PendingCommandSession>>;

    /// Store a session, replacing any previous one for the same key
    async fn put_session(&self, session: PendingCommandSession) -> StorageResult<()>;

    /// Remove the session for (chat, user); a missing session is not an error
    async fn delete_session(&self, chat_id: ChatId, user_id: UserId) -> StorageResult<()>;
}

#[async_trait]
pub trait ShoppingListStore: Send + Sync {
    async fn add_item(&self, item: NewShoppingItem) -> StorageResult<ShoppingItem>;

    /// All items of a chat in insertion order
    async fn items(&self, chat_id: ChatId) -> StorageResult<Vec<ShoppingItem>>;

    /// A single item, only if it belongs to the chat
    async fn item(&self, chat_id: ChatId, item_id: i64) -> StorageResult<Option<ShoppingItem>>;

    /// Returns whether an item was deleted
    async fn delete_item(&self, chat_id: ChatId, item_id: i64) -> StorageResult<bool>;

    /// Returns the number of deleted items
    async fn clear(&self, chat_id: ChatId) -> StorageResult<u64>;
}

/// Everything the bot persists
pub trait Storage: SessionTracker + ShoppingListStore {}

impl<T: SessionTracker + ShoppingListStore> Storage for T {}
