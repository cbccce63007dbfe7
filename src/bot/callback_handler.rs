//! Callback Handler module for processing inline keyboard callback queries
//!
//! Handlers acknowledge the query themselves, the router only dispatches.
//! Payloads come from buttons the bot created, so a payload that doesn't
//! parse is our bug and is reported as a failure, not as user input.

use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use teloxide::utils::html;
use tracing::{debug, info};

use super::client::Reply;
use super::context::BotContext;
use crate::localization::{t, t_args};
use crate::update::CallbackQuery;

/// Parse a confirmation flag from callback data
pub fn parse_confirmation(payload: &str) -> Result<bool> {
    match payload {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => bail!("Unable to parse confirmation from the callback query data {payload:?}"),
    }
}

/// `del:<item id>`
pub fn handle_del_callback_query<'a>(
    ctx: &'a BotContext,
    q: &'a CallbackQuery,
    payload: &'a str,
) -> BoxFuture<'a, Result<()>> {
    async move {
        ctx.acknowledge(&q.id).await;

        let chat_id = q.message.chat.id;
        let item_id: i64 = payload.parse().with_context(|| {
            format!("Unable to parse the item id from the callback query data {payload:?}")
        })?;

        let item = ctx
            .storage
            .item(chat_id, item_id)
            .await
            .with_context(|| format!("Unable to get a shopping item (item_id={item_id})"))?;

        let text = match item {
            Some(item) => {
                ctx.storage
                    .delete_item(chat_id, item_id)
                    .await
                    .with_context(|| format!("Unable to delete a shopping item (item_id={item_id})"))?;
                info!(chat_id, item_id, user_id = q.from.id, "Shopping item deleted");
                format!(
                    "{}\n\n{}",
                    t_args("del-success", &[("name", html::escape(&item.name).as_str())]),
                    t("del-anything-else")
                )
            }
            None => {
                debug!(chat_id, item_id, "Shopping item is already gone");
                t("del-not-found")
            }
        };

        ctx.remove_keyboard(chat_id, q.message.id).await;
        ctx.reply(chat_id, Reply::text(text)).await;
        Ok(())
    }
    .boxed()
}

/// `clear:1` wipes the list, `clear:0` cancels
pub fn handle_clear_callback_query<'a>(
    ctx: &'a BotContext,
    q: &'a CallbackQuery,
    payload: &'a str,
) -> BoxFuture<'a, Result<()>> {
    async move {
        ctx.acknowledge(&q.id).await;

        let chat_id = q.message.chat.id;
        let confirmed = parse_confirmation(payload)?;

        let text = if confirmed {
            let deleted = ctx
                .storage
                .clear(chat_id)
                .await
                .with_context(|| format!("Unable to delete all shopping items (chat_id={chat_id})"))?;
            info!(chat_id, deleted, user_id = q.from.id, "Shopping list cleared");
            format!("{}\n\n{}", t("clear-success"), t("clear-success-hint"))
        } else {
            t("clear-cancelled")
        };

        ctx.remove_keyboard(chat_id, q.message.id).await;
        ctx.reply(chat_id, Reply::text(text)).await;
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confirmation() {
        for payload in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(parse_confirmation(payload).unwrap());
        }
        for payload in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!parse_confirmation(payload).unwrap());
        }
        for payload in ["", "yes", "2", "tRuE"] {
            assert!(parse_confirmation(payload).is_err());
        }
    }
}
