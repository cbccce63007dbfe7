//! Command registry: maps a command name to its handlers.
//!
//! There are three kinds of handlers:
//! - command handlers run for bot commands like `/add` or `/del`. Most of
//!   them just start an interaction with the user;
//! - unfinished command handlers complete two-step commands. `/add`
//!   without an item asks what to add and the user answers in a separate
//!   message, which is handled here;
//! - callback query handlers react to inline keyboard buttons, e.g. the
//!   item buttons sent by `/del`.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use futures::future::BoxFuture;

use super::callback_handler::{handle_clear_callback_query, handle_del_callback_query};
use super::context::BotContext;
use super::message_handler::{
    handle_add, handle_add_session, handle_clear, handle_del, handle_help, handle_list,
};
use crate::update::{CallbackQuery, Message};

pub const COMMAND_START: &str = "start";
pub const COMMAND_HELP: &str = "help";
pub const COMMAND_ADD: &str = "add";
pub const COMMAND_LIST: &str = "list";
pub const COMMAND_DEL: &str = "del";
pub const COMMAND_CLEAR: &str = "clear";

/// Handles a command message, or the message completing an unfinished command
pub type CommandHandler = for<'a> fn(&'a BotContext, &'a Message) -> BoxFuture<'a, Result<()>>;

/// Handles a callback query; receives the decoded payload
pub type CallbackQueryHandler =
    for<'a> fn(&'a BotContext, &'a CallbackQuery, &'a str) -> BoxFuture<'a, Result<()>>;

/// A command and its handlers; any handler slot may be empty
#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub show_in_help: bool,
    pub command_handler: Option<CommandHandler>,
    pub unfinished_command_handler: Option<CommandHandler>,
    pub callback_query_handler: Option<CallbackQueryHandler>,
}

impl CommandDescriptor {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            description: None,
            show_in_help: false,
            command_handler: None,
            unfinished_command_handler: None,
            callback_query_handler: None,
        }
    }

    /// List the command in the help message with a description
    pub fn with_help(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self.show_in_help = true;
        self
    }

    pub fn on_command(mut self, handler: CommandHandler) -> Self {
        self.command_handler = Some(handler);
        self
    }

    pub fn on_unfinished_command(mut self, handler: CommandHandler) -> Self {
        self.unfinished_command_handler = Some(handler);
        self
    }

    pub fn on_callback_query(mut self, handler: CallbackQueryHandler) -> Self {
        self.callback_query_handler = Some(handler);
        self
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("show_in_help", &self.show_in_help)
            .field("command_handler", &self.command_handler.is_some())
            .field("unfinished_command_handler", &self.unfinished_command_handler.is_some())
            .field("callback_query_handler", &self.callback_query_handler.is_some())
            .finish()
    }
}

/// Immutable table of commands, built once at startup and shared read-only
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    descriptors: Vec<CommandDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    /// Build a registry; a repeated name replaces the earlier descriptor
    pub fn new(descriptors: impl IntoIterator<Item = CommandDescriptor>) -> Self {
        let mut registry = Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
        };
        for descriptor in descriptors {
            match registry.index.get(descriptor.name) {
                Some(&position) => registry.descriptors[position] = descriptor,
                None => {
                    registry
                        .index
                        .insert(descriptor.name, registry.descriptors.len());
                    registry.descriptors.push(descriptor);
                }
            }
        }
        registry
    }

    /// The shopping list commands
    pub fn shopping_list() -> Self {
        Self::new([
            // Telegram sends /start on the user's behalf when they open the bot
            CommandDescriptor::new(COMMAND_START).on_command(handle_help),
            CommandDescriptor::new(COMMAND_HELP)
                .with_help("Show the list of available commands and short descriptions")
                .on_command(handle_help),
            CommandDescriptor::new(COMMAND_ADD)
                .with_help("Add an item into your shopping list")
                .on_command(handle_add)
                .on_unfinished_command(handle_add_session),
            CommandDescriptor::new(COMMAND_LIST)
                .with_help("Display items from your shopping list")
                .on_command(handle_list),
            CommandDescriptor::new(COMMAND_DEL)
                .with_help("Delete an item from your shopping list")
                .on_command(handle_del)
                .on_callback_query(handle_del_callback_query),
            CommandDescriptor::new(COMMAND_CLEAR)
                .with_help("Delete all items from your shopping list")
                .on_command(handle_clear)
                .on_callback_query(handle_clear_callback_query),
        ])
    }

    pub fn lookup(&self, name: &str) -> Option<&CommandDescriptor> {
        self.index
            .get(name)
            .map(|&position| &self.descriptors[position])
    }

    /// Commands shown in help, in registration order
    pub fn help_entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.show_in_help)
            .filter_map(|descriptor| Some((descriptor.name, descriptor.description?)))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::shopping_list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop<'a>(_ctx: &'a BotContext, _msg: &'a Message) -> BoxFuture<'a, Result<()>> {
        async { Ok(()) }.boxed()
    }

    #[test]
    fn test_shopping_list_lookup() {
        let registry = CommandRegistry::shopping_list();
        assert_eq!(registry.len(), 6);

        let add = registry.lookup(COMMAND_ADD).unwrap();
        assert!(add.command_handler.is_some());
        assert!(add.unfinished_command_handler.is_some());
        assert!(add.callback_query_handler.is_none());

        let del = registry.lookup(COMMAND_DEL).unwrap();
        assert!(del.callback_query_handler.is_some());
        assert!(del.unfinished_command_handler.is_none());

        assert!(registry.lookup("bogus").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_start_is_the_only_hidden_command() {
        let registry = CommandRegistry::shopping_list();
        let hidden: Vec<_> = registry
            .descriptors
            .iter()
            .filter(|descriptor| !descriptor.show_in_help)
            .map(|descriptor| descriptor.name)
            .collect();
        assert_eq!(hidden, vec![COMMAND_START]);
    }

    #[test]
    fn test_help_entries_keep_registration_order() {
        let registry = CommandRegistry::shopping_list();
        let names: Vec<_> = registry.help_entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["help", "add", "list", "del", "clear"]);
    }

    #[test]
    fn test_repeated_name_replaces_descriptor() {
        let registry = CommandRegistry::new([
            CommandDescriptor::new("x").with_help("first"),
            CommandDescriptor::new("y"),
            CommandDescriptor::new("x").on_command(noop),
        ]);
        assert_eq!(registry.len(), 2);
        let x = registry.lookup("x").unwrap();
        assert!(x.command_handler.is_some());
        assert!(!x.show_in_help);
        assert_eq!(registry.help_entries().count(), 0);
    }
}
