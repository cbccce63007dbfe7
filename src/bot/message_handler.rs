//! Message Handler module for bot commands and unfinished command messages

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use teloxide::utils::html;
use tracing::{debug, info};

use super::client::Reply;
use super::commands::COMMAND_ADD;
use super::context::BotContext;
use super::ui_builder::{
    clear_confirmation_keyboard, format_shopping_list, help_message, item_deletion_keyboard,
    user_mention,
};
use crate::dialogue::{validate_item_name, ItemNameError, PendingCommandSession, MAX_ITEM_NAME_LENGTH};
use crate::localization::{t, t_args};
use crate::models::NewShoppingItem;
use crate::update::{Message, Sender};

fn sender_of(msg: &Message) -> Result<&Sender> {
    msg.from.as_ref().context("Message has no sender")
}

/// `/start` and `/help`
pub fn handle_help<'a>(ctx: &'a BotContext, msg: &'a Message) -> BoxFuture<'a, Result<()>> {
    async move {
        let reply = help_message(&ctx.commands, msg.from.as_ref(), true);
        ctx.reply(msg.chat.id, reply).await;
        Ok(())
    }
    .boxed()
}

/// `/add`: adds the inline argument right away, otherwise asks what to add
pub fn handle_add<'a>(ctx: &'a BotContext, msg: &'a Message) -> BoxFuture<'a, Result<()>> {
    async move {
        if !msg.command_arguments().is_empty() {
            return add_item_from_message(ctx, msg).await;
        }

        let sender = sender_of(msg)?;
        ctx.storage
            .put_session(PendingCommandSession::new(COMMAND_ADD, msg.chat.id, sender.id))
            .await
            .with_context(|| {
                format!(
                    "Unable to create an unfinished command (chat_id={}, user_id={})",
                    msg.chat.id, sender.id
                )
            })?;
        debug!(chat_id = msg.chat.id, user_id = sender.id, "Waiting for the item name");

        let mut reply = Reply::text(t_args("add-prompt", &[("mention", user_mention(sender).as_str())]));
        // Under privacy mode the bot only sees replies in groups
        if !msg.chat.is_private {
            reply = reply.with_force_reply();
        }
        ctx.reply(msg.chat.id, reply).await;
        Ok(())
    }
    .boxed()
}

/// The message answering `/add`'s question
pub fn handle_add_session<'a>(ctx: &'a BotContext, msg: &'a Message) -> BoxFuture<'a, Result<()>> {
    add_item_from_message(ctx, msg).boxed()
}

async fn add_item_from_message(ctx: &BotContext, msg: &Message) -> Result<()> {
    let sender = sender_of(msg)?;
    let input = if msg.bot_command().is_some() {
        msg.command_arguments()
    } else {
        msg.text.as_str()
    };

    let name = match validate_item_name(input) {
        Ok(name) => name,
        Err(reason) => {
            let text = match reason {
                ItemNameError::Empty => t("add-item-name-empty"),
                ItemNameError::TooLong => t_args(
                    "add-item-name-too-long",
                    &[("max", MAX_ITEM_NAME_LENGTH.to_string().as_str())],
                ),
            };
            // Keep the command open, the user can try again
            ctx.storage
                .put_session(PendingCommandSession::new(COMMAND_ADD, msg.chat.id, sender.id))
                .await
                .context("Unable to reopen the unfinished add command")?;
            ctx.reply(msg.chat.id, Reply::text(text)).await;
            return Ok(());
        }
    };

    let item = ctx
        .storage
        .add_item(NewShoppingItem {
            name,
            chat_id: msg.chat.id,
            created_by: sender.id,
        })
        .await
        .with_context(|| {
            format!(
                "Unable to add a new shopping item (chat_id={}, user_id={})",
                msg.chat.id, sender.id
            )
        })?;
    info!(chat_id = msg.chat.id, item_id = item.id, "Shopping item added");

    let text = t_args("add-success", &[("name", html::escape(&item.name).as_str())]);
    ctx.reply(msg.chat.id, Reply::text(text)).await;
    Ok(())
}

/// `/list`
pub fn handle_list<'a>(ctx: &'a BotContext, msg: &'a Message) -> BoxFuture<'a, Result<()>> {
    async move {
        let items = ctx
            .storage
            .items(msg.chat.id)
            .await
            .with_context(|| format!("Unable to get shopping items (chat_id={})", msg.chat.id))?;

        let text = if items.is_empty() {
            t("list-empty")
        } else {
            format!("{}\n\n<pre>{}</pre>", t("list-title"), format_shopping_list(&items))
        };
        ctx.reply(msg.chat.id, Reply::text(text)).await;
        Ok(())
    }
    .boxed()
}

/// `/del`: offers one button per item
pub fn handle_del<'a>(ctx: &'a BotContext, msg: &'a Message) -> BoxFuture<'a, Result<()>> {
    async move {
        let items = ctx
            .storage
            .items(msg.chat.id)
            .await
            .with_context(|| format!("Unable to get shopping items (chat_id={})", msg.chat.id))?;

        let reply = if items.is_empty() {
            Reply::text(t("del-nothing-to-delete"))
        } else {
            Reply::text(t("del-prompt")).with_keyboard(item_deletion_keyboard(&items)?)
        };
        ctx.reply(msg.chat.id, reply).await;
        Ok(())
    }
    .boxed()
}

/// `/clear`: asks for confirmation before wiping the list
pub fn handle_clear<'a>(ctx: &'a BotContext, msg: &'a Message) -> BoxFuture<'a, Result<()>> {
    async move {
        let items = ctx
            .storage
            .items(msg.chat.id)
            .await
            .with_context(|| format!("Unable to get shopping items (chat_id={})", msg.chat.id))?;

        let reply = if items.is_empty() {
            Reply::text(t("del-nothing-to-delete"))
        } else {
            Reply::text(t("clear-prompt")).with_keyboard(clear_confirmation_keyboard()?)
        };
        ctx.reply(msg.chat.id, reply).await;
        Ok(())
    }
    .boxed()
}
