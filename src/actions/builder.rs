//! Outbound reply composition
//!
//! Handlers are assembled declaratively: pick a payload (a literal, one
//! of several candidates, or something fetched from a content provider),
//! pick an addressing mode, build. The result is a [`Handler`] that
//! resolves everything at dispatch time and degrades to a no-op when the
//! update has no conversation or the payload cannot be produced.

use super::Handler;
use crate::chat::{ChatClient, MediaRef};
use crate::content::{fetch_or_none, ContentProvider, ContentRef};
use crate::random::{self, RandomSource};
use crate::update::InboundUpdate;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Where the outgoing message points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Addressing {
    /// Plain message into the conversation
    #[default]
    Normal,
    /// Reply to the message that triggered the action
    AsReply,
    /// Reply to the message the triggering message itself replied to
    ToRepliedMessage,
}

/// One concrete thing to send.
#[derive(Debug, Clone)]
enum Payload {
    Text(String),
    Sticker(MediaRef),
    Photo {
        media: MediaRef,
        caption: Option<String>,
    },
    Video {
        media: MediaRef,
        caption: Option<String>,
    },
}

/// How the payload is produced at dispatch time.
enum PayloadPlan {
    One(Payload),
    OneOf(Vec<Payload>),
    Fetched(Arc<dyn ContentProvider>),
}

/// Builder for [`OutboundAction`] handlers.
///
/// Payload setters replace each other; the last call wins. Without any
/// payload the built action sends nothing.
pub struct OutboundActionBuilder {
    client: Arc<dyn ChatClient>,
    random: Arc<dyn RandomSource>,
    plan: Option<PayloadPlan>,
    addressing: Addressing,
}

impl OutboundActionBuilder {
    /// Starts a builder around the shared chat client and random source.
    #[must_use]
    pub fn new(client: Arc<dyn ChatClient>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            client,
            random,
            plan: None,
            addressing: Addressing::Normal,
        }
    }

    /// Sends a fixed text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.plan = Some(PayloadPlan::One(Payload::Text(text.into())));
        self
    }

    /// Sends a fixed sticker by file id.
    #[must_use]
    pub fn sticker(mut self, file_id: impl Into<String>) -> Self {
        self.plan = Some(PayloadPlan::One(Payload::Sticker(MediaRef::FileId(
            file_id.into(),
        ))));
        self
    }

    /// Sends one sticker drawn uniformly from `file_ids`.
    #[must_use]
    pub fn random_sticker_from(mut self, file_ids: &[&str]) -> Self {
        let candidates = file_ids
            .iter()
            .map(|id| Payload::Sticker(MediaRef::FileId((*id).to_string())))
            .collect();
        self.plan = Some(PayloadPlan::OneOf(candidates));
        self
    }

    /// Sends a fixed photo without caption.
    #[must_use]
    pub fn photo(mut self, media: MediaRef) -> Self {
        self.plan = Some(PayloadPlan::One(Payload::Photo {
            media,
            caption: None,
        }));
        self
    }

    /// Sends one photo drawn uniformly from `media`.
    #[must_use]
    pub fn random_photo_from(mut self, media: &[MediaRef]) -> Self {
        let candidates = media
            .iter()
            .map(|m| Payload::Photo {
                media: m.clone(),
                caption: None,
            })
            .collect();
        self.plan = Some(PayloadPlan::OneOf(candidates));
        self
    }

    /// Sends a fixed video without caption.
    #[must_use]
    pub fn video(mut self, media: MediaRef) -> Self {
        self.plan = Some(PayloadPlan::One(Payload::Video {
            media,
            caption: None,
        }));
        self
    }

    /// Sends one video drawn uniformly from `media`.
    #[must_use]
    pub fn random_video_from(mut self, media: &[MediaRef]) -> Self {
        let candidates = media
            .iter()
            .map(|m| Payload::Video {
                media: m.clone(),
                caption: None,
            })
            .collect();
        self.plan = Some(PayloadPlan::OneOf(candidates));
        self
    }

    /// Sends whatever `provider` returns at dispatch time.
    #[must_use]
    pub fn fetched_from(mut self, provider: Arc<dyn ContentProvider>) -> Self {
        self.plan = Some(PayloadPlan::Fetched(provider));
        self
    }

    /// Replies to the triggering message.
    #[must_use]
    pub fn as_reply(mut self) -> Self {
        self.addressing = Addressing::AsReply;
        self
    }

    /// Replies to the message the trigger replied to, when there is one.
    #[must_use]
    pub fn to_replied_message(mut self) -> Self {
        self.addressing = Addressing::ToRepliedMessage;
        self
    }

    /// Finishes the handler.
    #[must_use]
    pub fn build(self) -> OutboundAction {
        OutboundAction {
            client: self.client,
            random: self.random,
            plan: self.plan,
            addressing: self.addressing,
        }
    }
}

/// A built outbound reply, ready to run as an action handler.
pub struct OutboundAction {
    client: Arc<dyn ChatClient>,
    random: Arc<dyn RandomSource>,
    plan: Option<PayloadPlan>,
    addressing: Addressing,
}

impl OutboundAction {
    async fn resolve_payload(&self) -> Option<Payload> {
        match self.plan.as_ref()? {
            PayloadPlan::One(payload) => Some(payload.clone()),
            PayloadPlan::OneOf(candidates) => {
                random::pick(self.random.as_ref(), candidates).cloned()
            }
            PayloadPlan::Fetched(provider) => fetch_or_none(provider.as_ref())
                .await
                .map(Payload::from_content),
        }
    }
}

impl Payload {
    fn from_content(content: ContentRef) -> Self {
        match content {
            ContentRef::Text(text) => Self::Text(text),
            ContentRef::Photo { url, caption } => Self::Photo {
                media: MediaRef::Url(url),
                caption,
            },
            ContentRef::Video { url, caption } => Self::Video {
                media: MediaRef::Url(url),
                caption,
            },
        }
    }
}

#[async_trait]
impl Handler for OutboundAction {
    async fn run(&self, update: &InboundUpdate) -> Result<()> {
        let Some(conversation) = update.conversation else {
            debug!("skipping send, update carries no conversation");
            return Ok(());
        };

        let Some(payload) = self.resolve_payload().await else {
            debug!(%conversation, "skipping send, no payload available");
            return Ok(());
        };

        let reply_to = match self.addressing {
            Addressing::Normal => None,
            Addressing::AsReply => update.message_id,
            Addressing::ToRepliedMessage => update.reply_to,
        };

        match payload {
            Payload::Text(text) => {
                self.client.send_text(conversation, &text, reply_to).await?;
            }
            Payload::Sticker(media) => {
                self.client
                    .send_sticker(conversation, &media, reply_to)
                    .await?;
            }
            Payload::Photo { media, caption } => {
                self.client
                    .send_photo(conversation, &media, caption.as_deref(), reply_to)
                    .await?;
            }
            Payload::Video { media, caption } => {
                self.client
                    .send_video(conversation, &media, caption.as_deref(), reply_to)
                    .await?;
            }
        }

        Ok(())
    }
}
