//! Shared fixtures: an in-memory bot with a recording messenger and a
//! scripted assistant.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use teloxide::types::{ChatId, InlineKeyboardButtonKind, InlineKeyboardMarkup, MessageId};

use nutribot::ai::TextGenerator;
use nutribot::bot::{BotContext, Keyboard, Messenger, Router};
use nutribot::errors::{AiError, MessagingError, StorageError};
use nutribot::localization::Localizer;
use nutribot::meal_plan::KvMealPlanStore;
use nutribot::profile::{KvProfileStore, Profile, ProfileField, ProfileRepository};
use nutribot::session::SessionStore;
use nutribot::storage::{InMemoryStore, KeyValueStore};
use nutribot::update::{ChatUser, IncomingUpdate};

pub const CHAT: i64 = 4242;

/// One outbound call seen by [`RecordingMessenger`]
#[derive(Clone, Debug)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    CallbackAnswer(String),
    Typing(ChatId),
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingMessenger {
    pub fn all(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts of sent (not edited) messages, oldest first
    pub fn texts(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> String {
        self.texts().pop().unwrap_or_default()
    }

    /// Callback payloads of the most recent inline keyboard
    pub fn last_inline_payloads(&self) -> Vec<String> {
        let markup = self.all().into_iter().rev().find_map(|s| match s {
            Sent::Text {
                keyboard: Some(Keyboard::Inline(markup)),
                ..
            } => Some(markup),
            Sent::Edit {
                keyboard: Some(markup),
                ..
            } => Some(markup),
            _ => None,
        });

        markup
            .map(|m| {
                m.inline_keyboard
                    .iter()
                    .flatten()
                    .filter_map(|b| match &b.kind {
                        InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Keyboard attached to the most recent sent message
    pub fn last_keyboard(&self) -> Option<Keyboard> {
        self.all().into_iter().rev().find_map(|s| match s {
            Sent::Text { keyboard, .. } => Some(keyboard),
            _ => None,
        })?
    }

    pub fn answered_callbacks(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|s| match s {
                Sent::CallbackAnswer(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), MessagingError> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), MessagingError> {
        self.sent.lock().unwrap().push(Sent::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessagingError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::CallbackAnswer(callback_id.to_string()));
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<(), MessagingError> {
        self.sent.lock().unwrap().push(Sent::Typing(chat_id));
        Ok(())
    }
}

/// Replies with queued answers in order; an empty queue is a failure
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, AiError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn push_ok(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_err(&self, err: AiError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AiError::EmptyResponse))
    }
}

/// Profile storage that rejects every call
pub struct FailingProfiles;

fn unavailable() -> StorageError {
    StorageError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl ProfileRepository for FailingProfiles {
    async fn get_profile(&self, _chat_id: ChatId) -> Result<Profile, StorageError> {
        Err(unavailable())
    }

    async fn save_profile_fields(
        &self,
        _chat_id: ChatId,
        _fields: Vec<ProfileField>,
    ) -> Result<Profile, StorageError> {
        Err(unavailable())
    }

    async fn reset_profile(&self, _chat_id: ChatId) -> Result<(), StorageError> {
        Err(unavailable())
    }
}

pub struct TestBot {
    pub router: Router,
    pub messenger: Arc<RecordingMessenger>,
    pub ai: Arc<ScriptedGenerator>,
    pub store: InMemoryStore,
    pub sessions: SessionStore,
    pub profiles: Arc<KvProfileStore>,
    pub meal_plans: Arc<KvMealPlanStore>,
}

impl TestBot {
    pub fn new(ai_enabled: bool) -> Self {
        Self::build(ai_enabled, None)
    }

    /// A bot whose handlers see `profiles` instead of the in-memory store
    pub fn with_profiles(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self::build(false, Some(profiles))
    }

    fn build(ai_enabled: bool, profile_override: Option<Arc<dyn ProfileRepository>>) -> Self {
        let store = InMemoryStore::new();
        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        let messenger = Arc::new(RecordingMessenger::default());
        let ai = Arc::new(ScriptedGenerator::default());
        let sessions = SessionStore::new(shared.clone());
        let profiles = Arc::new(KvProfileStore::new(shared.clone()));
        let meal_plans = Arc::new(KvMealPlanStore::new(shared));

        let ctx = BotContext {
            messenger: messenger.clone(),
            sessions: sessions.clone(),
            profiles: profile_override.unwrap_or_else(|| profiles.clone() as Arc<dyn ProfileRepository>),
            meal_plans: meal_plans.clone(),
            ai: ai_enabled.then(|| ai.clone() as Arc<dyn TextGenerator>),
            localizer: Arc::new(Localizer::new("ru").unwrap()),
        };

        Self {
            router: Router::new(Arc::new(ctx)),
            messenger,
            ai,
            store,
            sessions,
            profiles,
            meal_plans,
        }
    }

    pub fn chat(&self) -> ChatId {
        ChatId(CHAT)
    }

    pub async fn text(&self, text: &str) {
        self.router
            .route(IncomingUpdate::text(CHAT, text, user()))
            .await;
    }

    pub async fn press(&self, data: &str) {
        self.router
            .route(IncomingUpdate::callback(CHAT, "cb-1", data, user()))
            .await;
    }
}

pub fn user() -> ChatUser {
    ChatUser {
        id: CHAT as u64,
        first_name: "Иван".to_string(),
        username: Some("ivan".to_string()),
        language_code: Some("ru".to_string()),
    }
}
