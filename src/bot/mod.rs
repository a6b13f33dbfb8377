//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `router`: Decides which handler owns an incoming update
//! - `message_handler`: Executes commands and answers free text
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `dialogue_manager`: Advances pending dialogs one reply at a time
//! - `profile_completion`: Computes nutrition targets for complete profiles
//! - `ui_builder`: Creates keyboards and formats messages
//! - `messenger`: Outbound messaging contract and its Telegram client
//! - `context`: Collaborators shared by all handlers

pub mod callback_handler;
pub mod context;
pub mod dialogue_manager;
pub mod message_handler;
pub mod messenger;
pub mod profile_completion;
pub mod router;
pub mod ui_builder;

pub use context::BotContext;
pub use messenger::{Keyboard, Messenger, TelegramMessenger};
pub use router::Router;
