#![deny(missing_docs)]
//! Banterbot - a webhook-driven Telegram chat bot
//!
//! Reacts to commands and free-text triggers with stickers, photos,
//! videos and text, some hardcoded and some fetched from public content
//! APIs. Updates arrive over an HTTP webhook, every delivery is
//! acknowledged immediately, and free-text triggers are throttled per
//! conversation so the bot stays funny instead of noisy.

/// Action registry, trigger predicates and outbound reply builders
pub mod actions;
/// Chat platform client
pub mod chat;
/// Configuration management
pub mod config;
/// Clients for the public content APIs
pub mod content;
/// Per-conversation trigger throttling
pub mod cooldown;
/// Shared randomness
pub mod random;
/// Retry handling for flaky upstreams
pub mod resilience;
/// HTTP ingress (webhook and health probe)
pub mod server;
/// Platform-neutral inbound update envelope
pub mod update;
