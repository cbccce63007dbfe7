//! Bot module for routing Telegram updates to command handlers
//!
//! This module is split into several submodules:
//! - `router`: Dispatches updates and reacts to routing failures
//! - `commands`: The command registry and handler signatures
//! - `message_handler`: Handles bot commands and unfinished command messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `client`: The outbound platform interface used by handlers
//! - `context`: Dependencies shared by every handler

pub mod callback_handler;
pub mod client;
pub mod commands;
pub mod context;
pub mod message_handler;
pub mod router;
pub mod ui_builder;

pub use client::{BotClient, CallbackAcknowledger, InlineButton, Reply, ReplySender};
pub use commands::{CommandDescriptor, CommandRegistry};
pub use context::BotContext;
pub use router::UpdateRouter;
