//! Update routing: picks the handler for an update and reacts to failures.
//!
//! A message with a leading bot command goes to that command's handler.
//! Any other message continues the sender's pending command, if there is one.
//! Callback queries are routed by the command encoded in their data.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::client::Reply;
use super::context::BotContext;
use super::ui_builder::help_message;
use crate::callback_data;
use crate::errors::{ErrorClass, RoutingError};
use crate::localization::t;
use crate::update::{CallbackQuery, Message, Update};

pub struct UpdateRouter {
    ctx: Arc<BotContext>,
}

impl UpdateRouter {
    pub fn new(ctx: BotContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// Dispatch an update on its own task; the caller never waits for it
    pub fn spawn(self: &Arc<Self>, update: Update) -> JoinHandle<()> {
        let router = Arc::clone(self);
        tokio::spawn(async move { router.dispatch(update).await })
    }

    /// Route an update and handle the outcome
    pub async fn dispatch(&self, update: Update) {
        if let Err(err) = self.route(&update).await {
            self.route_error(&update, err).await;
        }
    }

    /// Route an update to its handler without handling failures
    pub async fn route(&self, update: &Update) -> Result<(), RoutingError> {
        match update {
            Update::CallbackQuery(q) => self.route_callback_query(q).await,
            Update::Message(msg) => self.route_message(msg).await,
        }
    }

    async fn route_message(&self, msg: &Message) -> Result<(), RoutingError> {
        let chat_id = msg.chat.id;
        debug!(chat_id, user_id = ?msg.user_id(), "Incoming message");

        if let Some(command) = msg.bot_command() {
            let descriptor = self
                .ctx
                .commands
                .lookup(command)
                .ok_or_else(|| RoutingError::UnsupportedCommand(command.to_string()))?;
            let handler = descriptor.command_handler.ok_or_else(|| {
                RoutingError::NoHandlerFound(format!("/{command} has no command handler"))
            })?;

            debug!(chat_id, command, "Running command handler");
            return handler(self.context(), msg)
                .await
                .map_err(|source| RoutingError::Handler {
                    command: command.to_string(),
                    source,
                });
        }

        let user_id = msg.user_id().ok_or_else(|| {
            RoutingError::NoHandlerFound("message without a sender".to_string())
        })?;
        // Photos, stickers and service messages can't continue a command
        if msg.text.trim().is_empty() {
            return Err(RoutingError::NoHandlerFound("message without text".to_string()));
        }

        let session = self
            .ctx
            .storage
            .get_session(chat_id, user_id)
            .await
            .map_err(|source| RoutingError::Storage {
                operation: "get",
                chat_id,
                user_id,
                source,
            })?
            .ok_or_else(|| RoutingError::NoHandlerFound("no unfinished command".to_string()))?;

        // Consumed before the handler runs, a failure must not leave it behind
        self.ctx
            .storage
            .delete_session(chat_id, user_id)
            .await
            .map_err(|source| RoutingError::Storage {
                operation: "delete",
                chat_id,
                user_id,
                source,
            })?;

        let command = session.command.as_str();
        let handler = self
            .ctx
            .commands
            .lookup(command)
            .and_then(|descriptor| descriptor.unfinished_command_handler)
            .ok_or_else(|| {
                RoutingError::NoHandlerFound(format!(
                    "/{command} has no unfinished command handler"
                ))
            })?;

        debug!(chat_id, user_id, command, "Continuing unfinished command");
        handler(self.context(), msg)
            .await
            .map_err(|source| RoutingError::Handler {
                command: command.to_string(),
                source,
            })
    }

    async fn route_callback_query(&self, q: &CallbackQuery) -> Result<(), RoutingError> {
        debug!(
            chat_id = q.message.chat.id,
            user_id = q.from.id,
            data = %q.data,
            "Incoming callback query"
        );

        let data = callback_data::decode(&q.data)?;
        let handler = self
            .ctx
            .commands
            .lookup(data.command)
            .and_then(|descriptor| descriptor.callback_query_handler)
            .ok_or_else(|| {
                RoutingError::NoHandlerFound(format!(
                    "/{} has no callback query handler",
                    data.command
                ))
            })?;

        handler(self.context(), q, data.payload)
            .await
            .map_err(|source| RoutingError::Handler {
                command: data.command.to_string(),
                source,
            })
    }

    /// Unhandled input gets the help text (plain messages only), anything
    /// else an apology without details
    async fn route_error(&self, update: &Update, err: RoutingError) {
        let (msg, from_callback) = match update {
            Update::Message(msg) => (msg, false),
            Update::CallbackQuery(q) => (&q.message, true),
        };
        let chat_id = msg.chat.id;

        match err.class() {
            ErrorClass::UnhandledInput => {
                info!(chat_id, from_callback, error = %err, "Unhandled input");
                if from_callback || msg.text.is_empty() {
                    return;
                }
                let reply = help_message(&self.ctx.commands, msg.from.as_ref(), false);
                self.ctx.reply(chat_id, reply).await;
            }
            ErrorClass::Internal => {
                let chain = format!("{:#}", anyhow::Error::new(err));
                error!(chat_id, from_callback, error = %chain, "Failed to handle update");
                self.ctx.reply(chat_id, Reply::text(t("error-internal"))).await;
            }
        }
    }
}
