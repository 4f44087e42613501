//! Chat platform client
//!
//! Handlers send through the [`ChatClient`] trait; production wires in
//! the teloxide-backed implementation, tests record calls instead.

/// Teloxide-backed client with retrying sends.
pub mod telegram;

pub use telegram::TelegramChatClient;

use crate::resilience::Transient;
use async_trait::async_trait;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use thiserror::Error;

/// Reference to a message accepted by the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    /// Conversation the message landed in
    pub conversation: ChatId,
    /// Platform-assigned message id
    pub message_id: MessageId,
}

/// Outbound media payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Telegram file id of previously uploaded media
    FileId(String),
    /// Publicly reachable URL the platform fetches itself
    Url(String),
}

/// Failure sending through the chat platform.
#[derive(Debug, Error)]
pub enum SendError {
    /// The platform could not be reached
    #[error("chat network error: {0}")]
    Network(String),
    /// The platform asked for a pause before the next attempt
    #[error("chat rate limited, retry in {0:?}")]
    RateLimited(Duration),
    /// The platform rejected the request outright
    #[error("chat send rejected: {0}")]
    Rejected(String),
}

impl Transient for SendError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited(_))
    }
}

/// Send surface of the chat platform.
///
/// Every method posts into one conversation, optionally as a reply to an
/// earlier message, and returns a reference to the sent message.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(
        &self,
        conversation: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef, SendError>;

    /// Sends a photo with an optional caption.
    async fn send_photo(
        &self,
        conversation: ChatId,
        photo: &MediaRef,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef, SendError>;

    /// Sends a sticker.
    async fn send_sticker(
        &self,
        conversation: ChatId,
        sticker: &MediaRef,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef, SendError>;

    /// Sends a video with an optional caption.
    async fn send_video(
        &self,
        conversation: ChatId,
        video: &MediaRef,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef, SendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SendError::Network("reset".to_string()).is_transient());
        assert!(SendError::RateLimited(Duration::from_secs(3)).is_transient());
        assert!(!SendError::Rejected("chat not found".to_string()).is_transient());
    }
}
