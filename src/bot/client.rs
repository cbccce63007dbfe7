//! Outbound side of the messaging platform, as seen by the router and handlers

use anyhow::Result;
use async_trait::async_trait;

use crate::update::ChatId;

/// A button that sends callback data back to the bot when pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// An HTML formatted message to send to a chat
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Vec<Vec<InlineButton>>>,
    /// Ask the client to show a reply interface to the addressed user only
    pub force_reply: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_keyboard(mut self, rows: Vec<Vec<InlineButton>>) -> Self {
        self.keyboard = Some(rows);
        self
    }

    pub fn with_force_reply(mut self) -> Self {
        self.force_reply = true;
        self
    }
}

#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, chat_id: ChatId, reply: Reply) -> Result<()>;

    /// Drop the inline keyboard from a message the bot sent earlier
    async fn remove_keyboard(&self, chat_id: ChatId, message_id: i32) -> Result<()>;
}

#[async_trait]
pub trait CallbackAcknowledger: Send + Sync {
    /// Tell the platform the callback query was received, so the client
    /// stops showing a loading indicator
    async fn acknowledge(&self, callback_query_id: &str) -> Result<()>;
}

/// Everything handlers need from the platform
pub trait BotClient: ReplySender + CallbackAcknowledger {}

impl<T: ReplySender + CallbackAcknowledger> BotClient for T {}
