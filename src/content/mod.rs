//! Third-party content providers
//!
//! Provides a unified fetch interface over the joke/filler APIs the bot
//! replies with. Each provider gets its own base URL and its own retrying
//! HTTP caller; handlers treat any surfaced failure as "no content".

/// Implementations of the individual content providers
pub mod providers;

pub use providers::{BaconClient, InspiroClient, InsultClient, MetaphorClient, YesNoClient};

use crate::config::CONTENT_HTTP_TIMEOUT_SECS;
use crate::random::{self, RandomSource};
use crate::resilience::{retry_transient, RetryPolicy, Transient};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur fetching third-party content
#[derive(Debug, Error)]
pub enum ContentError {
    /// Error during network communication
    #[error("network error: {0}")]
    Network(String),
    /// Non-success status returned by the provider
    #[error("api returned status {0}")]
    Status(StatusCode),
    /// Response body did not match the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Provider misconfiguration detected at call time
    #[error("provider not configured: {0}")]
    MissingConfig(String),
}

impl Transient for ContentError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status(status) => {
                status.is_server_error() || *status == StatusCode::REQUEST_TIMEOUT
            }
            Self::Malformed(_) | Self::MissingConfig(_) => false,
        }
    }
}

/// One piece of content ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    /// Plain text for a message body
    Text(String),
    /// Photo reachable by URL, with an optional caption
    Photo {
        /// Where the platform fetches the photo from
        url: String,
        /// Caption shown under the photo
        caption: Option<String>,
    },
    /// Video or gif reachable by URL, with an optional caption
    Video {
        /// Where the platform fetches the video from
        url: String,
        /// Caption shown under the video
        caption: Option<String>,
    },
}

/// Uniform fetch surface over the content providers.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Fetches one piece of content.
    async fn fetch_content(&self) -> Result<ContentRef, ContentError>;
}

/// Degrades a provider failure to "no content available".
///
/// The dispatcher never sees a raw transport error from a content API;
/// the handler simply skips its reply.
pub async fn fetch_or_none(provider: &dyn ContentProvider) -> Option<ContentRef> {
    match provider.fetch_content().await {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(provider = provider.name(), "content fetch failed: {e}");
            None
        }
    }
}

/// Pool of interchangeable providers; each fetch draws one at random.
pub struct ProviderPool {
    name: &'static str,
    providers: Vec<Arc<dyn ContentProvider>>,
    random: Arc<dyn RandomSource>,
}

impl ProviderPool {
    /// Creates a pool that picks between `providers` on every fetch.
    #[must_use]
    pub fn new(
        name: &'static str,
        providers: Vec<Arc<dyn ContentProvider>>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            name,
            providers,
            random,
        }
    }
}

#[async_trait]
impl ContentProvider for ProviderPool {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_content(&self) -> Result<ContentRef, ContentError> {
        let Some(provider) = random::pick(self.random.as_ref(), &self.providers) else {
            return Err(ContentError::MissingConfig(format!(
                "provider pool {} is empty",
                self.name
            )));
        };
        provider.fetch_content().await
    }
}

/// HTTP caller for one logical endpoint: a reqwest client plus the
/// retry policy applied to every call through it.
#[derive(Clone)]
pub struct ResilientClient {
    http: HttpClient,
    policy: RetryPolicy,
}

impl ResilientClient {
    /// Pairs an HTTP client with the retry policy for this endpoint.
    #[must_use]
    pub fn new(http: HttpClient, policy: RetryPolicy) -> Self {
        Self { http, policy }
    }

    /// GETs `url` and decodes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Network` on connectivity issues,
    /// `ContentError::Status` on non-success status codes, or
    /// `ContentError::Malformed` if decoding fails. Transient failures
    /// are retried per the policy before surfacing.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        url: &str,
    ) -> Result<T, ContentError> {
        retry_transient(self.policy, operation_name, || async {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| ContentError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ContentError::Status(status));
            }

            response.json::<T>().await.map_err(|e| {
                if e.is_decode() {
                    ContentError::Malformed(e.to_string())
                } else {
                    ContentError::Network(e.to_string())
                }
            })
        })
        .await
    }

    /// GETs `url` and returns the plain-text body.
    ///
    /// # Errors
    ///
    /// Same surface as [`ResilientClient::get_json`], minus decoding.
    pub async fn get_text(&self, operation_name: &str, url: &str) -> Result<String, ContentError> {
        retry_transient(self.policy, operation_name, || async {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| ContentError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ContentError::Status(status));
            }

            response
                .text()
                .await
                .map_err(|e| ContentError::Network(e.to_string()))
        })
        .await
    }
}

/// Creates the HTTP client shared by the content providers.
///
/// The request timeout prevents infinite hangs when an API is slow or
/// unresponsive.
#[must_use]
pub fn create_http_client() -> HttpClient {
    let timeout = Duration::from_secs(CONTENT_HTTP_TIMEOUT_SECS);
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}
