//! Telegram implementation of the chat client
//!
//! Wraps `teloxide::Bot` and retries transient API failures with
//! exponential backoff and jitter before surfacing an error.

use super::{ChatClient, MediaRef, MessageRef, SendError};
use crate::config::{TELEGRAM_INITIAL_BACKOFF_MS, TELEGRAM_MAX_BACKOFF_SECS, TELEGRAM_MAX_RETRIES};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, Message, MessageId, ReplyParameters};
use teloxide::RequestError;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;
use url::Url;

/// Chat client backed by the Telegram Bot API.
pub struct TelegramChatClient {
    bot: Bot,
}

impl TelegramChatClient {
    /// Creates a client over an already configured bot.
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatClient for TelegramChatClient {
    async fn send_text(
        &self,
        conversation: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef, SendError> {
        let sent = retry_send("send_text", || async {
            let mut req = self.bot.send_message(conversation, text.to_string());
            if let Some(reply) = reply_to {
                req = req.reply_parameters(ReplyParameters::new(reply));
            }
            req.await
        })
        .await?;
        Ok(message_ref(&sent))
    }

    async fn send_photo(
        &self,
        conversation: ChatId,
        photo: &MediaRef,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef, SendError> {
        let file = input_file(photo)?;
        let sent = retry_send("send_photo", || async {
            let mut req = self.bot.send_photo(conversation, file.clone());
            if let Some(caption) = caption {
                req = req.caption(caption.to_string());
            }
            if let Some(reply) = reply_to {
                req = req.reply_parameters(ReplyParameters::new(reply));
            }
            req.await
        })
        .await?;
        Ok(message_ref(&sent))
    }

    async fn send_sticker(
        &self,
        conversation: ChatId,
        sticker: &MediaRef,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef, SendError> {
        let file = input_file(sticker)?;
        let sent = retry_send("send_sticker", || async {
            let mut req = self.bot.send_sticker(conversation, file.clone());
            if let Some(reply) = reply_to {
                req = req.reply_parameters(ReplyParameters::new(reply));
            }
            req.await
        })
        .await?;
        Ok(message_ref(&sent))
    }

    async fn send_video(
        &self,
        conversation: ChatId,
        video: &MediaRef,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef, SendError> {
        let file = input_file(video)?;
        let sent = retry_send("send_video", || async {
            let mut req = self.bot.send_video(conversation, file.clone());
            if let Some(caption) = caption {
                req = req.caption(caption.to_string());
            }
            if let Some(reply) = reply_to {
                req = req.reply_parameters(ReplyParameters::new(reply));
            }
            req.await
        })
        .await?;
        Ok(message_ref(&sent))
    }
}

/// Retry a Telegram send with exponential backoff on transient failures.
///
/// The retry strategy uses exponential backoff with jitter to avoid
/// thundering herd:
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max retries: 3 (configurable via constants in `config.rs`)
async fn retry_send<F, Fut>(operation_name: &str, operation: F) -> Result<Message, SendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Message, RequestError>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_secs(TELEGRAM_MAX_BACKOFF_SECS))
        .map(jitter) // Add jitter to prevent thundering herd
        .take(TELEGRAM_MAX_RETRIES);

    RetryIf::spawn(retry_strategy, operation, transient_request_error)
        .await
        .map_err(|e| {
            warn!("Telegram {operation_name} failed after retries: {e}");
            map_send_error(e)
        })
}

/// Whether a Telegram API failure is worth retrying.
fn transient_request_error(err: &RequestError) -> bool {
    matches!(
        err,
        RequestError::Network(_) | RequestError::Io(_) | RequestError::RetryAfter(_)
    )
}

fn map_send_error(err: RequestError) -> SendError {
    match err {
        RequestError::Network(e) => SendError::Network(e.to_string()),
        RequestError::Io(e) => SendError::Network(e.to_string()),
        RequestError::RetryAfter(secs) => SendError::RateLimited(secs.duration()),
        other => SendError::Rejected(other.to_string()),
    }
}

fn input_file(media: &MediaRef) -> Result<InputFile, SendError> {
    match media {
        MediaRef::FileId(id) => Ok(InputFile::file_id(FileId(id.clone()))),
        MediaRef::Url(raw) => {
            let url = Url::parse(raw)
                .map_err(|e| SendError::Rejected(format!("invalid media url {raw}: {e}")))?;
            Ok(InputFile::url(url))
        }
    }
}

fn message_ref(sent: &Message) -> MessageRef {
    MessageRef {
        conversation: sent.chat.id,
        message_id: sent.id,
    }
}
