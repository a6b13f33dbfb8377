//! Normalized inbound updates.
//!
//! The router works on these plain structures rather than on teloxide's
//! types, so handlers and tests never depend on the transport's shape.

use teloxide::types::{CallbackQuery, ChatId, Message, MessageId, User};

/// The Telegram user behind an update
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatUser {
    pub id: u64,
    pub first_name: String,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

impl ChatUser {
    /// Name to greet the user with; falls back to the username
    pub fn display_name(&self) -> Option<String> {
        let first = self.first_name.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    }
}

impl From<&User> for ChatUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            first_name: user.first_name.clone(),
            username: user.username.clone(),
            language_code: user.language_code.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: Option<MessageId>,
    pub text: Option<String>,
    pub from: Option<ChatUser>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IncomingCallback {
    pub id: String,
    pub chat_id: ChatId,
    /// Message the pressed button belongs to
    pub message_id: Option<MessageId>,
    pub data: Option<String>,
    pub from: ChatUser,
}

#[derive(Clone, Debug, PartialEq)]
pub enum IncomingUpdate {
    Message(IncomingMessage),
    Callback(IncomingCallback),
}

impl IncomingUpdate {
    pub fn chat_id(&self) -> ChatId {
        match self {
            IncomingUpdate::Message(m) => m.chat_id,
            IncomingUpdate::Callback(c) => c.chat_id,
        }
    }

    pub fn language_code(&self) -> Option<&str> {
        match self {
            IncomingUpdate::Message(m) => m.from.as_ref().and_then(|u| u.language_code.as_deref()),
            IncomingUpdate::Callback(c) => c.from.language_code.as_deref(),
        }
    }

    /// Text message shorthand used by tests and local tooling
    pub fn text(chat_id: i64, text: &str, from: ChatUser) -> Self {
        IncomingUpdate::Message(IncomingMessage {
            chat_id: ChatId(chat_id),
            message_id: None,
            text: Some(text.to_string()),
            from: Some(from),
        })
    }

    /// Callback shorthand used by tests and local tooling
    pub fn callback(chat_id: i64, id: &str, data: &str, from: ChatUser) -> Self {
        IncomingUpdate::Callback(IncomingCallback {
            id: id.to_string(),
            chat_id: ChatId(chat_id),
            message_id: Some(MessageId(1)),
            data: Some(data.to_string()),
            from,
        })
    }
}

impl From<&Message> for IncomingUpdate {
    fn from(msg: &Message) -> Self {
        IncomingUpdate::Message(IncomingMessage {
            chat_id: msg.chat.id,
            message_id: Some(msg.id),
            text: msg.text().map(str::to_string),
            from: msg.from.as_ref().map(ChatUser::from),
        })
    }
}

impl From<&CallbackQuery> for IncomingUpdate {
    fn from(q: &CallbackQuery) -> Self {
        let from = ChatUser::from(&q.from);
        // Inaccessible messages still carry their chat; private chats share the user id
        let chat_id = q
            .message
            .as_ref()
            .map(|m| m.chat().id)
            .unwrap_or(ChatId(from.id as i64));

        IncomingUpdate::Callback(IncomingCallback {
            id: q.id.0.clone(),
            chat_id,
            message_id: q.message.as_ref().map(|m| m.id()),
            data: q.data.clone(),
            from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let mut user = ChatUser {
            id: 1,
            first_name: " Иван ".to_string(),
            username: Some("ivan_p".to_string()),
            language_code: None,
        };
        assert_eq!(user.display_name().as_deref(), Some("Иван"));

        user.first_name = String::new();
        assert_eq!(user.display_name().as_deref(), Some("ivan_p"));

        user.username = None;
        assert_eq!(user.display_name(), None);
    }
}
