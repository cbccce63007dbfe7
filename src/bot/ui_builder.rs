//! UI Builder module for creating keyboards and formatting messages

use teloxide::utils::html;

use super::client::{InlineButton, Reply};
use super::commands::{CommandRegistry, COMMAND_CLEAR, COMMAND_DEL};
use crate::callback_data;
use crate::errors::MalformedCallbackData;
use crate::localization::{t, t_args};
use crate::models::ShoppingItem;
use crate::update::Sender;

/// Greeting followed by the list of commands shown in help.
///
/// `is_start` selects a welcome greeting, otherwise the user is told their
/// input wasn't understood.
pub fn help_message(commands: &CommandRegistry, sender: Option<&Sender>, is_start: bool) -> Reply {
    let name = match sender {
        Some(sender) => html::escape(&sender.first_name),
        None => t("help-fallback-name"),
    };
    let greeting_key = if is_start {
        "help-greeting-start"
    } else {
        "help-greeting-unrecognised"
    };

    let command_lines = commands
        .help_entries()
        .map(|(name, description)| format!("/{name} - {description}"))
        .collect::<Vec<_>>()
        .join("\n");

    let text = [
        t_args(greeting_key, &[("name", name.as_str())]),
        t("help-intro"),
        t("help-commands"),
        format!("{}\n\n{}", t("help-section-shopping-list"), command_lines),
    ]
    .join("\n\n");

    Reply::text(text)
}

/// An HTML link mentioning the user
pub fn user_mention(sender: &Sender) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        sender.id,
        html::escape(&sender.first_name)
    )
}

/// Format items as a numbered list with right-aligned numbers
pub fn format_shopping_list(items: &[ShoppingItem]) -> String {
    let width = items.len().to_string().len();
    let mut result = String::new();

    for (i, item) in items.iter().enumerate() {
        result.push_str(&format!("{:>width$}. {}\n", i + 1, html::escape(&item.name)));
    }

    result
}

/// One button per item; pressing it deletes that item
pub fn item_deletion_keyboard(
    items: &[ShoppingItem],
) -> Result<Vec<Vec<InlineButton>>, MalformedCallbackData> {
    items
        .iter()
        .map(|item| {
            let data = callback_data::encode(COMMAND_DEL, item.id)?;
            Ok(vec![InlineButton::callback(item.name.clone(), data)])
        })
        .collect()
}

/// Yes/Cancel buttons confirming a full list wipe
pub fn clear_confirmation_keyboard() -> Result<Vec<Vec<InlineButton>>, MalformedCallbackData> {
    Ok(vec![vec![
        InlineButton::callback(t("clear-confirm-yes"), callback_data::encode(COMMAND_CLEAR, 1)?),
        InlineButton::callback(t("clear-confirm-cancel"), callback_data::encode(COMMAND_CLEAR, 0)?),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64, name: &str) -> ShoppingItem {
        ShoppingItem {
            id,
            name: name.to_string(),
            chat_id: 1,
            created_by: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_shopping_list_aligns_numbers() {
        let items: Vec<_> = (1..=10).map(|i| item(i, &format!("item {i}"))).collect();
        let formatted = format_shopping_list(&items);
        let lines: Vec<_> = formatted.lines().collect();
        assert_eq!(lines[0], " 1. item 1");
        assert_eq!(lines[9], "10. item 10");
    }

    #[test]
    fn test_format_shopping_list_escapes_names() {
        let formatted = format_shopping_list(&[item(1, "<b>salt</b> & pepper")]);
        assert_eq!(formatted, "1. &lt;b&gt;salt&lt;/b&gt; &amp; pepper\n");
    }

    #[test]
    fn test_item_deletion_keyboard() {
        let keyboard = item_deletion_keyboard(&[item(4, "milk"), item(9, "bread")]).unwrap();
        assert_eq!(keyboard.len(), 2);
        assert_eq!(keyboard[0][0], InlineButton::callback("milk", "del:4"));
        assert_eq!(keyboard[1][0], InlineButton::callback("bread", "del:9"));
    }

    #[test]
    fn test_clear_confirmation_keyboard() {
        let keyboard = clear_confirmation_keyboard().unwrap();
        assert_eq!(keyboard[0][0].callback_data, "clear:1");
        assert_eq!(keyboard[0][1].callback_data, "clear:0");
    }

    #[test]
    fn test_help_message_lists_visible_commands() {
        let sender = Sender {
            id: 5,
            first_name: "Ann".to_string(),
        };
        let reply = help_message(&CommandRegistry::shopping_list(), Some(&sender), true);
        assert!(reply.text.starts_with("Hi Ann,"));
        assert!(reply.text.contains("/add - Add an item into your shopping list"));
        assert!(reply.text.contains("/clear - "));
        assert!(!reply.text.contains("/start"));

        let reply = help_message(&CommandRegistry::shopping_list(), None, false);
        assert!(reply.text.starts_with("friend, I'm very sorry, but I don't understand you."));
    }

    #[test]
    fn test_user_mention_escapes_name() {
        let sender = Sender {
            id: 42,
            first_name: "<Bob>".to_string(),
        };
        assert_eq!(user_mention(&sender), "<a href=\"tg://user?id=42\">&lt;Bob&gt;</a>");
    }
}
