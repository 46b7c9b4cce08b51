//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles incoming text, voice and audio messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `commands` / `command_handler`: Parse and execute slash commands
//! - `grocery_handler`: Grocery list generation and editing
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Drives the capture review dialogue

pub mod callback_handler;
pub mod command_handler;
pub mod commands;
pub mod dialogue_manager;
pub mod grocery_handler;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use commands::{parse_command, BotCommand, CommandError};
pub use grocery_handler::resolve_range;
pub use ui_builder::{format_grocery_screen, format_recipe_review};
