//! Trigger predicates
//!
//! Two families: commands match the first token of the message exactly
//! and carry no cooldown, so repeating a command always answers.
//! Free-text triggers match a substring anywhere in the message and are
//! throttled per conversation, so one noisy phrase cannot flood a chat.

use super::Predicate;
use crate::cooldown::{cooldown_key, CooldownCache};
use crate::update::InboundUpdate;
use async_trait::async_trait;
use std::time::Duration;

/// Matches a bot command at the start of the message.
///
/// Only the first whitespace-separated token is considered, and a
/// `@BotName` suffix is ignored so `/boi@SomeBot` in a group chat still
/// matches `/boi`. Comparison is case-insensitive.
pub struct CommandPredicate {
    command: &'static str,
}

impl CommandPredicate {
    /// `command` includes the leading slash, e.g. `"/boi"`.
    #[must_use]
    pub fn new(command: &'static str) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Predicate for CommandPredicate {
    async fn can_handle(&self, update: &InboundUpdate) -> bool {
        let Some(text) = update.text.as_deref() else {
            return false;
        };
        let Some(first) = text.split_whitespace().next() else {
            return false;
        };
        let token = first.split_once('@').map_or(first, |(command, _bot)| command);
        token.eq_ignore_ascii_case(self.command)
    }
}

/// Matches a phrase anywhere in the message, at most once per
/// conversation per cooldown window.
///
/// The text check runs first; the cooldown is consumed only on the
/// evaluation that is about to return `true`. Marking and checking are
/// one atomic cache operation, so two racing updates in the same
/// conversation yield exactly one match.
pub struct ContainsPredicate {
    action_name: &'static str,
    needle: String,
    cooldowns: CooldownCache,
    window: Duration,
}

impl ContainsPredicate {
    /// `needle` is matched case-insensitively against the whole message.
    #[must_use]
    pub fn new(
        action_name: &'static str,
        needle: impl Into<String>,
        cooldowns: CooldownCache,
        window: Duration,
    ) -> Self {
        Self {
            action_name,
            needle: needle.into().to_lowercase(),
            cooldowns,
            window,
        }
    }
}

#[async_trait]
impl Predicate for ContainsPredicate {
    async fn can_handle(&self, update: &InboundUpdate) -> bool {
        let Some(text) = update.text.as_deref() else {
            return false;
        };
        if !text.to_lowercase().contains(&self.needle) {
            return false;
        }

        let key = cooldown_key(self.action_name, update.conversation);
        self.cooldowns.try_mark_once(&key, self.window).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use teloxide::types::ChatId;

    fn text_update(conversation: i64, text: &str) -> InboundUpdate {
        InboundUpdate {
            conversation: Some(ChatId(conversation)),
            text: Some(text.to_string()),
            ..InboundUpdate::default()
        }
    }

    fn fresh_cache() -> CooldownCache {
        CooldownCache::new(config::COOLDOWN_CACHE_CAPACITY)
    }

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_command_matches_first_token_only() {
        let predicate = CommandPredicate::new("/boi");

        assert!(predicate.can_handle(&text_update(1, "/boi")).await);
        assert!(predicate.can_handle(&text_update(1, "/boi extra words")).await);
        assert!(predicate.can_handle(&text_update(1, "  /boi")).await);
        assert!(!predicate.can_handle(&text_update(1, "please /boi")).await);
        assert!(!predicate.can_handle(&text_update(1, "/boing")).await);
        assert!(!predicate.can_handle(&text_update(1, "boi")).await);
    }

    #[tokio::test]
    async fn test_command_ignores_bot_name_suffix_and_case() {
        let predicate = CommandPredicate::new("/boi");

        assert!(predicate.can_handle(&text_update(1, "/boi@SomeBot")).await);
        assert!(predicate.can_handle(&text_update(1, "/BOI@somebot hi")).await);
        assert!(!predicate.can_handle(&text_update(1, "/nope@SomeBot")).await);
    }

    #[tokio::test]
    async fn test_command_declines_update_without_text() {
        let predicate = CommandPredicate::new("/boi");
        assert!(!predicate.can_handle(&InboundUpdate::default()).await);
    }

    #[tokio::test]
    async fn test_contains_matches_case_insensitively_anywhere() {
        let predicate = ContainsPredicate::new("ipad", " iPad", fresh_cache(), WINDOW);

        assert!(predicate.can_handle(&text_update(1, "send me an IPAD")).await);
        assert!(!predicate.can_handle(&text_update(2, "flipads are fine")).await);
        assert!(!predicate.can_handle(&InboundUpdate::default()).await);
    }

    #[tokio::test]
    async fn test_contains_yields_once_per_conversation_per_window() {
        let predicate = ContainsPredicate::new("ipad", " ipad", fresh_cache(), WINDOW);

        assert!(predicate.can_handle(&text_update(7, "send me an ipad")).await);
        assert!(!predicate.can_handle(&text_update(7, "send me an ipad")).await);
        // A different conversation has its own window
        assert!(predicate.can_handle(&text_update(8, "send me an ipad")).await);
    }

    #[tokio::test]
    async fn test_contains_non_match_leaves_the_window_untouched() {
        let predicate = ContainsPredicate::new("ipad", " ipad", fresh_cache(), WINDOW);

        assert!(!predicate.can_handle(&text_update(7, "unrelated chatter")).await);
        // The miss above must not have consumed the conversation's slot
        assert!(predicate.can_handle(&text_update(7, "send me an ipad")).await);
    }

    #[tokio::test]
    async fn test_contains_window_expires() {
        let predicate =
            ContainsPredicate::new("ipad", " ipad", fresh_cache(), Duration::from_millis(40));

        assert!(predicate.can_handle(&text_update(7, "an ipad please")).await);
        assert!(!predicate.can_handle(&text_update(7, "an ipad please")).await);

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(predicate.can_handle(&text_update(7, "an ipad please")).await);
    }

    #[tokio::test]
    async fn test_contains_updates_without_conversation_share_one_window() {
        let predicate = ContainsPredicate::new("ipad", " ipad", fresh_cache(), WINDOW);
        let floating = InboundUpdate {
            text: Some("an ipad please".to_string()),
            ..InboundUpdate::default()
        };

        assert!(predicate.can_handle(&floating).await);
        assert!(!predicate.can_handle(&floating).await);
    }
}
