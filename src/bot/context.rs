//! Collaborators shared by every handler for the lifetime of the process.

use std::sync::Arc;
use teloxide::types::{ChatId, InlineKeyboardMarkup};
use tracing::warn;

use crate::ai::TextGenerator;
use crate::errors::AiError;
use crate::localization::Localizer;
use crate::meal_plan::MealPlanRepository;
use crate::profile::ProfileRepository;
use crate::session::SessionStore;

use super::messenger::{Keyboard, Messenger};
use super::ui_builder::main_menu_keyboard;

/// Immutable handler context; all cross-update state lives behind the stores
pub struct BotContext {
    pub messenger: Arc<dyn Messenger>,
    pub sessions: SessionStore,
    pub profiles: Arc<dyn ProfileRepository>,
    pub meal_plans: Arc<dyn MealPlanRepository>,
    /// Present only when AI mode is enabled and configured
    pub ai: Option<Arc<dyn TextGenerator>>,
    pub localizer: Arc<Localizer>,
}

impl BotContext {
    pub fn ai_enabled(&self) -> bool {
        self.ai.is_some()
    }

    /// Ask the AI collaborator, showing a typing indicator while it works
    pub async fn generate(&self, chat_id: ChatId, prompt: &str) -> Result<String, AiError> {
        let Some(ai) = &self.ai else {
            return Err(AiError::Disabled);
        };

        if let Err(e) = self.messenger.send_typing(chat_id).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to send typing indicator");
        }

        ai.generate(prompt).await
    }

    /// Send a message; delivery failures are logged and not retried
    pub async fn send(&self, chat_id: ChatId, text: &str, keyboard: Option<Keyboard>) {
        if let Err(e) = self.messenger.send_text(chat_id, text, keyboard).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to send message");
        }
    }

    /// Send a localized message
    pub async fn say(&self, chat_id: ChatId, key: &str, lang: Option<&str>) {
        self.send(chat_id, &self.localizer.t(key, lang), None).await;
    }

    /// Send a localized message with the main menu keyboard
    pub async fn say_with_menu(&self, chat_id: ChatId, key: &str, lang: Option<&str>) {
        self.send(chat_id, &self.localizer.t(key, lang), Some(main_menu_keyboard()))
            .await;
    }

    /// Send a localized message with an inline keyboard
    pub async fn say_inline(&self, chat_id: ChatId, key: &str, lang: Option<&str>, markup: InlineKeyboardMarkup) {
        self.send(chat_id, &self.localizer.t(key, lang), Some(Keyboard::Inline(markup)))
            .await;
    }
}
