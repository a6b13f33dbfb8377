//! # Error Types Module
//!
//! Structured errors for the bot's collaborators: durable storage, the
//! outbound messaging client and the generative-text backend. Handlers
//! return [`BotError`], which the router catches at its boundary; messaging
//! failures are logged where they happen and never abort a handler.

use thiserror::Error;

/// Failures of the key-value storage and the records kept in it
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connectivity or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures reported by the outbound messaging client
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
}

/// Failures of the generative-text backend
#[derive(Error, Debug)]
pub enum AiError {
    /// AI mode is switched off or no client is configured
    #[error("AI mode is disabled")]
    Disabled,
    #[error("AI request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("AI backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("AI backend returned an empty response")]
    EmptyResponse,
    /// The response did not have the structure the caller asked for
    #[error("Malformed AI response: {0}")]
    Malformed(String),
}

/// Top-level error for update handling
#[derive(Error, Debug)]
pub enum BotError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        BotError::Storage(StorageError::Database(err))
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Storage(StorageError::Serialization(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = AiError::Status {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "AI backend returned 429: rate limited");

        let err = BotError::from(AiError::EmptyResponse);
        assert_eq!(err.to_string(), "AI backend returned an empty response");
    }

    #[test]
    fn test_serialization_error_converts_to_storage() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = BotError::from(json_err);
        assert!(matches!(err, BotError::Storage(StorageError::Serialization(_))));
    }
}
