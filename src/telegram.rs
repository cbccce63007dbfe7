//! Telegram transport: converts teloxide updates into the crate's own update
//! types, feeds them to the router and sends replies through the Bot API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, CallbackQueryId, ForceReply, InlineKeyboardButton, InlineKeyboardMarkup,
    MessageEntityKind, MessageId, ParseMode,
};
use teloxide::update_listeners::webhooks;
use tracing::{debug, info, warn};

use crate::bot::{
    BotContext, CallbackAcknowledger, CommandRegistry, InlineButton, Reply, ReplySender,
    UpdateRouter,
};
use crate::config::BotConfig;
use crate::storage::Storage;
use crate::update;

/// Bot API backed implementation of the platform client
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn inline_keyboard(rows: Vec<Vec<InlineButton>>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.into_iter().map(|row| {
        row.into_iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.callback_data))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl ReplySender for TelegramClient {
    async fn send(&self, chat_id: update::ChatId, reply: Reply) -> Result<()> {
        let request = self
            .bot
            .send_message(ChatId(chat_id), reply.text)
            .parse_mode(ParseMode::Html);
        let request = match reply.keyboard {
            Some(rows) => request.reply_markup(inline_keyboard(rows)),
            None if reply.force_reply => request.reply_markup(ForceReply::new().selective()),
            None => request,
        };
        request.await?;
        Ok(())
    }

    async fn remove_keyboard(&self, chat_id: update::ChatId, message_id: i32) -> Result<()> {
        self.bot
            .edit_message_reply_markup(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CallbackAcknowledger for TelegramClient {
    async fn acknowledge(&self, callback_query_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_query_id.to_string()))
            .await?;
        Ok(())
    }
}

fn convert_sender(user: &teloxide::types::User) -> update::Sender {
    update::Sender {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
    }
}

fn convert_chat(chat: &teloxide::types::Chat) -> update::Chat {
    update::Chat {
        id: chat.id.0,
        is_private: chat.is_private(),
    }
}

/// Convert a Telegram message; service messages become messages without text
pub fn convert_message(msg: &Message) -> update::Message {
    let entities = msg
        .entities()
        .unwrap_or_default()
        .iter()
        .map(|entity| update::MessageEntity {
            kind: match entity.kind {
                MessageEntityKind::BotCommand => update::EntityKind::BotCommand,
                _ => update::EntityKind::Other,
            },
            offset: entity.offset,
            length: entity.length,
        })
        .collect();

    update::Message {
        id: msg.id.0,
        chat: convert_chat(&msg.chat),
        from: msg.from.as_ref().map(convert_sender),
        text: msg.text().unwrap_or_default().to_string(),
        entities,
    }
}

/// Convert a callback query; queries without an attached message are dropped
pub fn convert_callback_query(q: &CallbackQuery) -> Option<update::CallbackQuery> {
    let attached = q.message.as_ref()?;
    let message = match attached.regular_message() {
        Some(msg) => convert_message(msg),
        None => update::Message::plain(attached.id().0, convert_chat(attached.chat()), None, ""),
    };

    Some(update::CallbackQuery {
        id: q.id.0.clone(),
        from: convert_sender(&q.from),
        message,
        data: q.data.clone().unwrap_or_default(),
    })
}

/// Publish the commands shown in help to the Telegram command menu
pub async fn publish_commands(bot: &Bot, commands: &CommandRegistry) {
    let menu: Vec<_> = commands
        .help_entries()
        .map(|(name, description)| BotCommand::new(name, description))
        .collect();
    if let Err(e) = bot.set_my_commands(menu).await {
        warn!(error = %e, "Failed to publish bot commands");
    }
}

async fn on_message(msg: Message, router: Arc<UpdateRouter>) -> ResponseResult<()> {
    router.spawn(update::Update::Message(convert_message(&msg)));
    Ok(())
}

async fn on_callback_query(q: CallbackQuery, router: Arc<UpdateRouter>) -> ResponseResult<()> {
    match convert_callback_query(&q) {
        Some(q) => {
            router.spawn(update::Update::CallbackQuery(q));
        }
        None => debug!(callback_query_id = %q.id.0, "Ignoring callback query without a message"),
    }
    Ok(())
}

/// Run the bot until interrupted, using a webhook when configured and long
/// polling otherwise
pub async fn run(config: &BotConfig, storage: Arc<dyn Storage>) -> Result<()> {
    let bot = Bot::new(&config.telegram_token);

    let me = bot.get_me().await.context("Failed to get bot info")?;
    info!(username = ?me.user.username, "Bot authorized");

    let commands = Arc::new(CommandRegistry::shopping_list());
    publish_commands(&bot, &commands).await;

    let ctx = BotContext::new(Arc::new(TelegramClient::new(bot.clone())), storage, commands);
    let router = Arc::new(UpdateRouter::new(ctx));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback_query));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![router])
        .default_handler(|upd| async move {
            debug!(update_id = upd.id.0, "Ignoring unsupported update");
        })
        .enable_ctrlc_handler()
        .build();

    match &config.webhook {
        Some(webhook) => {
            let address = SocketAddr::from(([0, 0, 0, 0], webhook.port));
            info!(url = %webhook.url, %address, "Starting bot in webhook mode");
            let listener = webhooks::axum(bot, webhooks::Options::new(address, webhook.url.clone()))
                .await
                .context("Failed to set up the webhook")?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        None => {
            info!("Starting bot in long polling mode");
            dispatcher.dispatch().await;
        }
    }

    info!("Bot stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(payload: serde_json::Value) -> Message {
        serde_json::from_value(payload).unwrap()
    }

    #[test]
    fn test_convert_command_message() {
        let msg = message(serde_json::json!({
            "message_id": 3,
            "date": 1_700_000_000i64,
            "chat": {"id": -100, "type": "group", "title": "Family"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
            "text": "/add@shoplist_bot milk",
            "entities": [{"type": "bot_command", "offset": 0, "length": 17}]
        }));

        let converted = convert_message(&msg);
        assert_eq!(converted.id, 3);
        assert_eq!(converted.chat.id, -100);
        assert!(!converted.chat.is_private);
        assert_eq!(converted.user_id(), Some(7));
        assert_eq!(converted.bot_command(), Some("add"));
        assert_eq!(converted.command_arguments(), "milk");
    }

    #[test]
    fn test_convert_mention_is_plain_text() {
        let msg = message(serde_json::json!({
            "message_id": 4,
            "date": 1_700_000_000i64,
            "chat": {"id": 7, "type": "private", "first_name": "Ann"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
            "text": "@bob bread",
            "entities": [{"type": "mention", "offset": 0, "length": 4}]
        }));

        let converted = convert_message(&msg);
        assert!(converted.chat.is_private);
        assert_eq!(converted.entities[0].kind, update::EntityKind::Other);
        assert_eq!(converted.bot_command(), None);
        assert_eq!(converted.text, "@bob bread");
    }

    #[test]
    fn test_convert_callback_query() {
        let q: CallbackQuery = serde_json::from_value(serde_json::json!({
            "id": "987",
            "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
            "data": "del:42",
            "chat_instance": "abc",
            "message": {
                "message_id": 11,
                "date": 1_700_000_000i64,
                "chat": {"id": 7, "type": "private", "first_name": "Ann"},
                "text": "Which item should be deleted?"
            }
        }))
        .unwrap();

        let converted = convert_callback_query(&q).unwrap();
        assert_eq!(converted.id, "987");
        assert_eq!(converted.from.id, 7);
        assert_eq!(converted.data, "del:42");
        assert_eq!(converted.message.id, 11);
        assert_eq!(converted.message.chat.id, 7);
    }
}
