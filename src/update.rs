//! Inbound update envelope
//!
//! The dispatcher and every predicate work against this small snapshot of
//! a Telegram update; the wire type stays at the webhook boundary.

use teloxide::types::{ChatId, Message, MessageId, Update, UpdateKind};

/// One inbound chat event, reduced to the fields the engine reads.
///
/// Every field is optional: a partial envelope is legal input and simply
/// matches fewer actions. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct InboundUpdate {
    /// Conversation the event belongs to
    pub conversation: Option<ChatId>,
    /// The triggering message itself
    pub message_id: Option<MessageId>,
    /// Free-text content, if the message carried any
    pub text: Option<String>,
    /// Message the triggering message replied to
    pub reply_to: Option<MessageId>,
}

impl InboundUpdate {
    /// Builds the envelope for a webhook update.
    ///
    /// Only plain messages carry dispatchable content; every other update
    /// kind maps to an empty envelope, which no action matches.
    #[must_use]
    pub fn from_update(update: &Update) -> Self {
        match &update.kind {
            UpdateKind::Message(msg) => Self::from_message(msg),
            _ => Self::default(),
        }
    }

    /// Builds the envelope for one message.
    #[must_use]
    pub fn from_message(msg: &Message) -> Self {
        Self {
            conversation: Some(msg.chat.id),
            message_id: Some(msg.id),
            text: msg.text().map(ToOwned::to_owned),
            reply_to: msg.reply_to_message().map(|replied| replied.id),
        }
    }
}
