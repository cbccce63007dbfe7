//! # Shopping List Telegram Bot
//!
//! A Telegram bot that keeps a shared shopping list per chat. Updates are
//! routed to command handlers through a static command registry; commands
//! that need a second message keep an unfinished command session in storage.

pub mod bot;
pub mod callback_data;
pub mod cli;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod memory_storage;
pub mod models;
pub mod storage;
pub mod telegram;
pub mod update;
