//! HTTP ingress
//!
//! One POST route takes Telegram webhook deliveries, one GET route
//! answers liveness probes. Delivery is decoupled from processing:
//! every authenticated request is acknowledged immediately and dispatch
//! runs on a tracked background task, so a slow or failing action never
//! pushes the platform into redelivering the same update.

use crate::actions::{DispatchOutcome, Dispatcher};
use crate::update::InboundUpdate;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::Update;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

/// Path the bot registers with `setWebhook`.
pub const WEBHOOK_PATH: &str = "/webhook";

const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared state behind the HTTP routes.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    tracker: TaskTracker,
    secret: Option<String>,
    deadline: Duration,
}

impl AppState {
    /// Bundles the dispatcher with the webhook secret and the
    /// per-update processing deadline.
    #[must_use]
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        tracker: TaskTracker,
        secret: Option<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            dispatcher,
            tracker,
            secret,
            deadline,
        }
    }
}

/// Builds the service router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(receive_update))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Update>, JsonRejection>,
) -> StatusCode {
    if !secret_token_valid(state.secret.as_deref(), &headers) {
        warn!("webhook rejected, secret token mismatch");
        return StatusCode::UNAUTHORIZED;
    }

    let update = match body {
        Ok(Json(update)) => update,
        Err(rejection) => {
            // Still acknowledged: redelivery would not make the body parse
            warn!("discarding undecodable webhook body: {rejection}");
            return StatusCode::OK;
        }
    };

    let update_id = update.id.0;
    let inbound = InboundUpdate::from_update(&update);
    let dispatcher = Arc::clone(&state.dispatcher);
    let deadline = state.deadline;

    state.tracker.spawn(async move {
        match tokio::time::timeout(deadline, dispatcher.dispatch(&inbound)).await {
            Ok(Ok(DispatchOutcome::Handled { action })) => {
                debug!(update_id, action, "update handled");
            }
            Ok(Ok(DispatchOutcome::NoMatch)) => {
                debug!(update_id, "update matched no action");
            }
            Ok(Err(e)) => {
                error!(update_id, "dispatch failed: {e:#}");
            }
            Err(_) => {
                error!(
                    update_id,
                    deadline_secs = deadline.as_secs(),
                    "dispatch deadline exceeded"
                );
            }
        }
    });

    StatusCode::OK
}

fn secret_token_valid(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|header| header == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_secret(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            SECRET_TOKEN_HEADER,
            HeaderValue::from_str(value).expect("valid header value"),
        );
        headers
    }

    #[test]
    fn test_no_configured_secret_accepts_any_request() {
        assert!(secret_token_valid(None, &HeaderMap::new()));
        assert!(secret_token_valid(None, &headers_with_secret("whatever")));
    }

    #[test]
    fn test_configured_secret_requires_the_matching_header() {
        assert!(secret_token_valid(Some("hunter2"), &headers_with_secret("hunter2")));
        assert!(!secret_token_valid(Some("hunter2"), &headers_with_secret("wrong")));
        assert!(!secret_token_valid(Some("hunter2"), &HeaderMap::new()));
    }
}
