//! Shared dependencies handed to every handler

use std::sync::Arc;

use tracing::warn;

use super::client::{BotClient, Reply};
use super::commands::CommandRegistry;
use crate::storage::Storage;
use crate::update::ChatId;

/// One instance per process, shared by all concurrent dispatches
pub struct BotContext {
    pub client: Arc<dyn BotClient>,
    pub storage: Arc<dyn Storage>,
    pub commands: Arc<CommandRegistry>,
}

impl BotContext {
    pub fn new(
        client: Arc<dyn BotClient>,
        storage: Arc<dyn Storage>,
        commands: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            client,
            storage,
            commands,
        }
    }

    /// Send a reply; failures are logged and never retried
    pub async fn reply(&self, chat_id: ChatId, reply: Reply) {
        if let Err(e) = self.client.send(chat_id, reply).await {
            warn!(chat_id, error = %e, "Failed to send reply");
        }
    }

    /// Hide the inline keyboard of an earlier bot message, best-effort
    pub async fn remove_keyboard(&self, chat_id: ChatId, message_id: i32) {
        if let Err(e) = self.client.remove_keyboard(chat_id, message_id).await {
            warn!(chat_id, message_id, error = %e, "Failed to remove inline keyboard");
        }
    }

    /// Acknowledge a callback query, best-effort
    pub async fn acknowledge(&self, callback_query_id: &str) {
        if let Err(e) = self.client.acknowledge(callback_query_id).await {
            warn!(callback_query_id, error = %e, "Failed to answer callback query");
        }
    }
}
