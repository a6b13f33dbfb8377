//! Top-level dispatch for every inbound update.

use std::sync::Arc;
use tracing::{debug, error};

use crate::commands::{classify, Classified};
use crate::errors::BotError;
use crate::update::{IncomingMessage, IncomingUpdate};

use super::callback_handler::callback_handler;
use super::context::BotContext;
use super::dialogue_manager::handle_dialog_reply;
use super::message_handler::{execute_command, handle_free_text, handle_substitute};

/// Decides which handler owns an update; the first matching rule wins:
///
/// 1. callback queries go to the callback table
/// 2. text with a pending dialog goes to the dialog, commands included
/// 3. recognized commands run
/// 4. other text goes to the AI when enabled, otherwise a menu reminder
/// 5. anything without text gets the navigation hint
#[derive(Clone)]
pub struct Router {
    ctx: Arc<BotContext>,
}

impl Router {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Route one update. Handler errors stop here: they are logged and the
    /// user gets an apology with the main menu.
    pub async fn route(&self, update: IncomingUpdate) {
        let chat_id = update.chat_id();
        let lang = update.language_code().map(str::to_string);

        if let Err(e) = self.dispatch(update).await {
            error!(chat_id = %chat_id, error = %e, "Failed to handle update");
            self.ctx.say_with_menu(chat_id, "error-generic", lang.as_deref()).await;
        }
    }

    async fn dispatch(&self, update: IncomingUpdate) -> Result<(), BotError> {
        match update {
            IncomingUpdate::Callback(callback) => callback_handler(&self.ctx, callback).await,
            IncomingUpdate::Message(message) => self.handle_message(message).await,
        }
    }

    async fn handle_message(&self, message: IncomingMessage) -> Result<(), BotError> {
        let ctx = &self.ctx;
        let chat_id = message.chat_id;
        let user = message.from.as_ref();
        let lang = user.and_then(|u| u.language_code.as_deref());

        let Some(text) = message.text.as_deref() else {
            debug!(chat_id = %chat_id, "Update without text");
            ctx.say_with_menu(chat_id, "navigation-hint", lang).await;
            return Ok(());
        };

        let session = ctx.sessions.get(chat_id).await;
        if !session.is_idle() {
            return handle_dialog_reply(ctx, session, text, lang).await;
        }

        match classify(text) {
            Classified::Command(command) => execute_command(ctx, chat_id, command, user, lang).await,
            Classified::Substitute(product) => handle_substitute(ctx, chat_id, &product, lang).await,
            Classified::FreeText(text) => handle_free_text(ctx, chat_id, &text, lang).await,
            Classified::Empty => {
                ctx.say_with_menu(chat_id, "use-menu", lang).await;
                Ok(())
            }
        }
    }
}
