//! The registered action list
//!
//! Everything the bot reacts to is wired here, in one place, in dispatch
//! order. Commands come first so an explicit `/command` always outranks a
//! free-text trigger that happens to match the same message. Free-text
//! triggers sit at the bottom and are throttled per conversation.

use super::predicates::{CommandPredicate, ContainsPredicate};
use super::{Action, ActionRegistry, OutboundActionBuilder};
use crate::chat::{ChatClient, MediaRef};
use crate::content::ContentProvider;
use crate::cooldown::CooldownCache;
use crate::random::RandomSource;
use std::sync::Arc;
use std::time::Duration;

/// Sticker and video payloads are Telegram file ids captured from the
/// bot's own uploads, so sends reuse media the platform already stores.
pub const BOI_STICKERS: &[&str] = &[
    "CAACAgIAAxkBAAIDb2aHkV5sVQKbN3J1q0e2dXg0aFl2AAKtEwACULPwSGNKtjRNSFDANgQ",
    "CAACAgIAAxkBAAIDcGaHkWfTxK0dY2hQ4mW9uZ7JcVfRAAKuEwACULPwSM2nB3zZS0d6NgQ",
    "CAACAgIAAxkBAAIDcWaHkXDq8ZzB5W0fXqT2nYk4bUwJAAKvEwACULPwSEVgm1JpHhXGNgQ",
];

/// See [`BOI_STICKERS`].
pub const BRUH_STICKERS: &[&str] = &[
    "CAACAgIAAxkBAAIDcmaHkX2jV8sJ0dQp5bZ1xWf6mHg3AAKwEwACULPwSP0kQzr3c1ZeNgQ",
    "CAACAgIAAxkBAAIDc2aHkYSHt2nK9cYq1gA0zXe7pJi4AAKxEwACULPwSLqVPXG-5vVdNgQ",
    "CAACAgIAAxkBAAIDdGaHkYxPw5rL2eRr8hB6yVd9qKj5AAKyEwACULPwSIHYtWlnmc9INgQ",
    "CAACAgIAAxkBAAIDdWaHkZNhx0tM4fSs0iC7zWe2rLk6AAKzEwACULPwSN4fVYmIlDkcNgQ",
];

/// See [`BOI_STICKERS`].
pub const NOPE_VIDEO: &str =
    "BAACAgIAAxkBAAIDdmaHkZ1v3qZVn1x4c2tQZm9oVXA1AAJ0FAACULPwSPYyGl0MyV0qNgQ";

/// Photo answered to anyone asking for an iPad.
pub const IPAD_PHOTO_URL: &str = "https://i.imgur.com/gGkBjRn.jpg";

/// Shared collaborators the catalog wires into every action.
pub struct ActionDeps {
    /// Chat platform send surface
    pub client: Arc<dyn ChatClient>,
    /// Shared entropy for candidate picks
    pub random: Arc<dyn RandomSource>,
    /// Per-conversation trigger throttle
    pub cooldowns: CooldownCache,
    /// How long a free-text trigger stays quiet per conversation
    pub trigger_window: Duration,
    /// Placeholder-text source for `/lipsum`
    pub lipsum: Arc<dyn ContentProvider>,
    /// Poster source for `/inspire`
    pub inspiro: Arc<dyn ContentProvider>,
    /// Insult source for `/insult`
    pub insult: Arc<dyn ContentProvider>,
    /// Verdict-gif source for `/yesno`
    pub yesno: Arc<dyn ContentProvider>,
}

/// Builds the production action list.
#[must_use]
pub fn default_registry(deps: &ActionDeps) -> ActionRegistry {
    let send = || OutboundActionBuilder::new(Arc::clone(&deps.client), Arc::clone(&deps.random));
    let throttled = |name: &'static str, needle: &str| {
        ContainsPredicate::new(name, needle, deps.cooldowns.clone(), deps.trigger_window)
    };

    ActionRegistry::new()
        .register(Action::new(
            "boi",
            Box::new(CommandPredicate::new("/boi")),
            Box::new(send().random_sticker_from(BOI_STICKERS).build()),
        ))
        .register(Action::new(
            "nope",
            Box::new(CommandPredicate::new("/nope")),
            Box::new(send().video(MediaRef::FileId(NOPE_VIDEO.to_string())).build()),
        ))
        .register(Action::new(
            "lipsum",
            Box::new(CommandPredicate::new("/lipsum")),
            Box::new(send().fetched_from(Arc::clone(&deps.lipsum)).build()),
        ))
        .register(Action::new(
            "inspire",
            Box::new(CommandPredicate::new("/inspire")),
            Box::new(send().fetched_from(Arc::clone(&deps.inspiro)).build()),
        ))
        .register(Action::new(
            "insult",
            Box::new(CommandPredicate::new("/insult")),
            Box::new(
                send()
                    .fetched_from(Arc::clone(&deps.insult))
                    .to_replied_message()
                    .build(),
            ),
        ))
        .register(Action::new(
            "yesno",
            Box::new(CommandPredicate::new("/yesno")),
            Box::new(send().fetched_from(Arc::clone(&deps.yesno)).build()),
        ))
        .register(Action::new(
            "ipad",
            Box::new(throttled("ipad", " ipad")),
            Box::new(
                send()
                    .photo(MediaRef::Url(IPAD_PHOTO_URL.to_string()))
                    .as_reply()
                    .build(),
            ),
        ))
        .register(Action::new(
            "bruh",
            Box::new(throttled("bruh", "bruh")),
            Box::new(send().random_sticker_from(BRUH_STICKERS).build()),
        ))
        .register(Action::new(
            "press_f",
            Box::new(throttled("press_f", "press f")),
            Box::new(send().text("F").build()),
        ))
}
