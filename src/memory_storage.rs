//! In-memory storage, used when no database is configured and in tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::dialogue::PendingCommandSession;
use crate::models::{NewShoppingItem, ShoppingItem};
use crate::storage::{SessionTracker, ShoppingListStore, StorageResult};
use crate::update::{ChatId, UserId};

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<(ChatId, UserId), PendingCommandSession>,
    // BTreeMap keyed by id keeps insertion order
    items: BTreeMap<i64, ShoppingItem>,
    latest_item_id: i64,
}

/// Process-local storage; everything is lost on restart
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending sessions across all chats
    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }
}

#[async_trait]
impl SessionTracker for MemoryStorage {
    async fn get_session(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> StorageResult<Option<PendingCommandSession>> {
        let inner = self.inner.lock().await;
        Ok(inner.sessions.get(&(chat_id, user_id)).cloned())
    }

    async fn put_session(&self, session: PendingCommandSession) -> StorageResult<()> {
        debug!(chat_id = session.chat_id, user_id = session.user_id, command = %session.command, "Storing unfinished command");
        let mut inner = self.inner.lock().await;
        inner
            .sessions
            .insert((session.chat_id, session.user_id), session);
        Ok(())
    }

    async fn delete_session(&self, chat_id: ChatId, user_id: UserId) -> StorageResult<()> {
        let mut inner = self.inner.lock().await;
        inner.sessions.remove(&(chat_id, user_id));
        Ok(())
    }
}

#[async_trait]
impl ShoppingListStore for MemoryStorage {
    async fn add_item(&self, item: NewShoppingItem) -> StorageResult<ShoppingItem> {
        let mut inner = self.inner.lock().await;
        inner.latest_item_id += 1;
        let stored = ShoppingItem {
            id: inner.latest_item_id,
            name: item.name,
            chat_id: item.chat_id,
            created_by: item.created_by,
            created_at: Utc::now(),
        };
        inner.items.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn items(&self, chat_id: ChatId) -> StorageResult<Vec<ShoppingItem>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .items
            .values()
            .filter(|item| item.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn item(&self, chat_id: ChatId, item_id: i64) -> StorageResult<Option<ShoppingItem>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .items
            .get(&item_id)
            .filter(|item| item.chat_id == chat_id)
            .cloned())
    }

    async fn delete_item(&self, chat_id: ChatId, item_id: i64) -> StorageResult<bool> {
        let mut inner = self.inner.lock().await;
        let belongs_to_chat = inner
            .items
            .get(&item_id)
            .is_some_and(|item| item.chat_id == chat_id);
        if belongs_to_chat {
            inner.items.remove(&item_id);
        }
        Ok(belongs_to_chat)
    }

    async fn clear(&self, chat_id: ChatId) -> StorageResult<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.items.len();
        inner.items.retain(|_, item| item.chat_id != chat_id);
        Ok((before - inner.items.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(name: &str, chat_id: ChatId) -> NewShoppingItem {
        NewShoppingItem {
            name: name.to_string(),
            chat_id,
            created_by: 7,
        }
    }

    #[tokio::test]
    async fn test_session_put_overwrites_same_key() {
        let storage = MemoryStorage::new();
        storage
            .put_session(PendingCommandSession::new("add", 1, 2))
            .await
            .unwrap();
        storage
            .put_session(PendingCommandSession::new("other", 1, 2))
            .await
            .unwrap();

        assert_eq!(storage.session_count().await, 1);
        let session = storage.get_session(1, 2).await.unwrap().unwrap();
        assert_eq!(session.command, "other");
    }

    #[tokio::test]
    async fn test_sessions_are_keyed_by_chat_and_user() {
        let storage = MemoryStorage::new();
        storage
            .put_session(PendingCommandSession::new("add", 1, 2))
            .await
            .unwrap();

        assert!(storage.get_session(1, 3).await.unwrap().is_none());
        assert!(storage.get_session(9, 2).await.unwrap().is_none());

        storage.delete_session(1, 2).await.unwrap();
        assert!(storage.get_session(1, 2).await.unwrap().is_none());
        // Deleting again is fine
        storage.delete_session(1, 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_items_are_scoped_to_chat() {
        let storage = MemoryStorage::new();
        let milk = storage.add_item(new_item("milk", 1)).await.unwrap();
        let bread = storage.add_item(new_item("bread", 1)).await.unwrap();
        let other = storage.add_item(new_item("eggs", 2)).await.unwrap();

        let names: Vec<_> = storage
            .items(1)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["milk", "bread"]);
        assert!(milk.id < bread.id);

        assert!(storage.item(1, other.id).await.unwrap().is_none());
        assert!(!storage.delete_item(1, other.id).await.unwrap());
        assert!(storage.delete_item(1, milk.id).await.unwrap());
        assert_eq!(storage.items(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_only_touches_one_chat() {
        let storage = MemoryStorage::new();
        storage.add_item(new_item("milk", 1)).await.unwrap();
        storage.add_item(new_item("bread", 1)).await.unwrap();
        storage.add_item(new_item("eggs", 2)).await.unwrap();

        assert_eq!(storage.clear(1).await.unwrap(), 2);
        assert!(storage.items(1).await.unwrap().is_empty());
        assert_eq!(storage.items(2).await.unwrap().len(), 1);
    }
}
