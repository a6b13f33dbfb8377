//! Outbound messaging: the contract the handlers talk to and its Telegram
//! implementation.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, ChatAction, InlineKeyboardMarkup, KeyboardMarkup, MessageId, ReplyMarkup,
};
use tracing::debug;

use crate::errors::MessagingError;

/// Keyboard attached to an outgoing message
#[derive(Clone, Debug, PartialEq)]
pub enum Keyboard {
    Inline(InlineKeyboardMarkup),
    Reply(KeyboardMarkup),
}

impl From<Keyboard> for ReplyMarkup {
    fn from(keyboard: Keyboard) -> Self {
        match keyboard {
            Keyboard::Inline(markup) => ReplyMarkup::InlineKeyboard(markup),
            Keyboard::Reply(markup) => ReplyMarkup::Keyboard(markup),
        }
    }
}

/// Outbound calls; each is a single request with no retry
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), MessagingError>;

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), MessagingError>;

    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessagingError>;

    async fn send_typing(&self, chat_id: ChatId) -> Result<(), MessagingError>;
}

/// [`Messenger`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), MessagingError> {
        let request = self.bot.send_message(chat_id, text);
        let sent = match keyboard {
            Some(keyboard) => request.reply_markup(ReplyMarkup::from(keyboard)).await?,
            None => request.await?,
        };
        debug!(chat_id = %chat_id, message_id = sent.id.0, "Message sent");
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), MessagingError> {
        let request = self.bot.edit_message_text(chat_id, message_id, text);
        match keyboard {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessagingError> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<(), MessagingError> {
        self.bot.send_chat_action(chat_id, ChatAction::Typing).await?;
        Ok(())
    }
}
