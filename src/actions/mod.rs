//! Action dispatch engine
//!
//! An inbound update is matched against an explicit, ordered list of
//! actions. Registration order is dispatch priority: the first predicate
//! to accept the update wins and only that action's handler runs.

/// Trigger predicates (commands and free-text matches)
pub mod predicates;

/// Declarative outbound reply composition
pub mod builder;

/// The registered action list
pub mod catalog;

pub use builder::{Addressing, OutboundAction, OutboundActionBuilder};
pub use catalog::{default_registry, ActionDeps};
pub use predicates::{CommandPredicate, ContainsPredicate};

use crate::update::InboundUpdate;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Eligibility test for one action against one inbound update.
///
/// Implementations may record a cooldown as a side effect, but only on
/// the exact evaluation that returns `true`.
#[async_trait]
pub trait Predicate: Send + Sync {
    /// Whether this action should handle `update`.
    async fn can_handle(&self, update: &InboundUpdate) -> bool;
}

/// The work an action performs once its predicate matched.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs the action for `update`.
    async fn run(&self, update: &InboundUpdate) -> Result<()>;
}

/// One registered action: a name for logs, its trigger, its effect.
pub struct Action {
    name: &'static str,
    predicate: Box<dyn Predicate>,
    handler: Box<dyn Handler>,
}

impl Action {
    /// Bundles a predicate and handler under a stable name.
    #[must_use]
    pub fn new(
        name: &'static str,
        predicate: Box<dyn Predicate>,
        handler: Box<dyn Handler>,
    ) -> Self {
        Self {
            name,
            predicate,
            handler,
        }
    }

    /// Name used in logs and dispatch outcomes.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Ordered set of registered actions.
///
/// Position is priority. The list is fixed at startup; nothing is
/// discovered or reordered at runtime.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<Action>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `action` at the lowest priority so far.
    #[must_use]
    pub fn register(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Registered names in priority order.
    #[must_use]
    pub fn action_names(&self) -> Vec<&'static str> {
        self.actions.iter().map(Action::name).collect()
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// How one update left the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An action matched and its handler completed
    Handled {
        /// Name of the action that ran
        action: &'static str,
    },
    /// Every predicate declined the update; a normal outcome
    NoMatch,
}

/// Routes each inbound update to at most one action.
pub struct Dispatcher {
    registry: ActionRegistry,
}

impl Dispatcher {
    /// Wraps a finished registry.
    #[must_use]
    pub fn new(registry: ActionRegistry) -> Self {
        Self { registry }
    }

    /// Dispatches one update.
    ///
    /// Predicates run in registration order; evaluation stops at the
    /// first match and that handler runs to completion. No match is a
    /// normal outcome.
    ///
    /// # Errors
    ///
    /// Propagates the matched handler's failure. Predicate evaluation
    /// itself never fails.
    pub async fn dispatch(&self, update: &InboundUpdate) -> Result<DispatchOutcome> {
        for action in &self.registry.actions {
            if action.predicate.can_handle(update).await {
                debug!(action = action.name, "action matched");
                action
                    .handler
                    .run(update)
                    .await
                    .with_context(|| format!("action {} failed", action.name))?;
                return Ok(DispatchOutcome::Handled {
                    action: action.name,
                });
            }
        }

        debug!(conversation = ?update.conversation, "no action matched");
        Ok(DispatchOutcome::NoMatch)
    }
}
