//! Content provider clients
//!
//! One client per upstream API. Each is constructed with its own base URL
//! and its own [`ResilientClient`], so retry budgets never bleed across
//! providers.

use super::{ContentError, ContentProvider, ContentRef, ResilientClient};
use async_trait::async_trait;
use serde::Deserialize;

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Bacon Ipsum filler-text client.
pub struct BaconClient {
    client: ResilientClient,
    base_url: String,
}

impl BaconClient {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(client: ResilientClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ContentProvider for BaconClient {
    fn name(&self) -> &'static str {
        "bacon"
    }

    async fn fetch_content(&self) -> Result<ContentRef, ContentError> {
        let url = endpoint(&self.base_url, "/api/?type=meat-and-filler&paras=2&format=json");
        let paragraphs: Vec<String> = self.client.get_json(self.name(), &url).await?;
        if paragraphs.is_empty() {
            return Err(ContentError::Malformed("empty paragraph list".to_string()));
        }
        Ok(ContentRef::Text(paragraphs.join("\n\n")))
    }
}

/// Metaphorpsum filler-text client.
pub struct MetaphorClient {
    client: ResilientClient,
    base_url: String,
}

impl MetaphorClient {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(client: ResilientClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ContentProvider for MetaphorClient {
    fn name(&self) -> &'static str {
        "metaphor"
    }

    async fn fetch_content(&self) -> Result<ContentRef, ContentError> {
        // One paragraph of three sentences, served as plain text
        let url = endpoint(&self.base_url, "/paragraphs/1/3");
        let body = self.client.get_text(self.name(), &url).await?;
        let text = body.trim();
        if text.is_empty() {
            return Err(ContentError::Malformed("empty paragraph".to_string()));
        }
        Ok(ContentRef::Text(text.to_string()))
    }
}

/// InspiroBot generated-poster client.
pub struct InspiroClient {
    client: ResilientClient,
    base_url: String,
}

impl InspiroClient {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(client: ResilientClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ContentProvider for InspiroClient {
    fn name(&self) -> &'static str {
        "inspiro"
    }

    async fn fetch_content(&self) -> Result<ContentRef, ContentError> {
        // The body is the URL of a freshly generated poster
        let url = endpoint(&self.base_url, "/api?generate=true");
        let body = self.client.get_text(self.name(), &url).await?;
        let poster_url = body.trim();
        if !poster_url.starts_with("http") {
            return Err(ContentError::Malformed(format!(
                "expected a poster url, got: {poster_url:.60}"
            )));
        }
        Ok(ContentRef::Photo {
            url: poster_url.to_string(),
            caption: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct InsultPayload {
    insult: String,
}

/// Evil Insult one-liner client.
pub struct InsultClient {
    client: ResilientClient,
    base_url: String,
}

impl InsultClient {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(client: ResilientClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ContentProvider for InsultClient {
    fn name(&self) -> &'static str {
        "insult"
    }

    async fn fetch_content(&self) -> Result<ContentRef, ContentError> {
        let url = endpoint(&self.base_url, "/generate_insult.php?lang=en&type=json");
        let payload: InsultPayload = self.client.get_json(self.name(), &url).await?;
        if payload.insult.is_empty() {
            return Err(ContentError::Malformed("empty insult".to_string()));
        }
        Ok(ContentRef::Text(payload.insult))
    }
}

#[derive(Debug, Deserialize)]
struct YesNoPayload {
    answer: String,
    image: String,
}

/// yesno.wtf answer-gif client.
pub struct YesNoClient {
    client: ResilientClient,
    base_url: String,
}

impl YesNoClient {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(client: ResilientClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ContentProvider for YesNoClient {
    fn name(&self) -> &'static str {
        "yesno"
    }

    async fn fetch_content(&self) -> Result<ContentRef, ContentError> {
        let url = endpoint(&self.base_url, "/api");
        let payload: YesNoPayload = self.client.get_json(self.name(), &url).await?;
        Ok(ContentRef::Video {
            url: payload.image,
            caption: Some(payload.answer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::create_http_client;
    use crate::resilience::RetryPolicy;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Full retry budget with millisecond delays so tests stay fast.
    fn fast_client() -> ResilientClient {
        ResilientClient::new(
            create_http_client(),
            RetryPolicy::new(3, Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn test_bacon_joins_paragraphs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .and(query_param("type", "meat-and-filler"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["one", "two"])))
            .mount(&server)
            .await;

        let bacon = BaconClient::new(fast_client(), server.uri());
        let content = bacon.fetch_content().await.expect("bacon responds");
        assert_eq!(content, ContentRef::Text("one\n\ntwo".to_string()));
    }

    #[tokio::test]
    async fn test_metaphor_trims_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paragraphs/1/3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("A metaphor.\n"))
            .mount(&server)
            .await;

        let metaphor = MetaphorClient::new(fast_client(), server.uri());
        let content = metaphor.fetch_content().await.expect("metaphor responds");
        assert_eq!(content, ContentRef::Text("A metaphor.".to_string()));
    }

    #[tokio::test]
    async fn test_inspiro_returns_poster_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("generate", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("https://generated.example/a.jpg\n"),
            )
            .mount(&server)
            .await;

        let inspiro = InspiroClient::new(fast_client(), server.uri());
        let content = inspiro.fetch_content().await.expect("inspiro responds");
        assert_eq!(
            content,
            ContentRef::Photo {
                url: "https://generated.example/a.jpg".to_string(),
                caption: None,
            }
        );
    }

    #[tokio::test]
    async fn test_inspiro_rejects_non_url_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<!DOCTYPE html>"))
            .mount(&server)
            .await;

        let inspiro = InspiroClient::new(fast_client(), server.uri());
        let err = inspiro.fetch_content().await.expect_err("html is not a url");
        assert!(matches!(err, ContentError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_insult_extracts_the_one_liner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/generate_insult.php"))
            .and(query_param("lang", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": "42",
                "language": "en",
                "insult": "You spineless bilge rat."
            })))
            .mount(&server)
            .await;

        let insult = InsultClient::new(fast_client(), server.uri());
        let content = insult.fetch_content().await.expect("insult responds");
        assert_eq!(
            content,
            ContentRef::Text("You spineless bilge rat.".to_string())
        );
    }

    #[tokio::test]
    async fn test_yesno_maps_answer_and_gif() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "yes",
                "forced": false,
                "image": "https://yesno.example/yes.gif"
            })))
            .mount(&server)
            .await;

        let yesno = YesNoClient::new(fast_client(), server.uri());
        let content = yesno.fetch_content().await.expect("yesno responds");
        assert_eq!(
            content,
            ContentRef::Video {
                url: "https://yesno.example/yes.gif".to_string(),
                caption: Some("yes".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_server_errors_retry_then_surface() {
        let server = MockServer::start().await;
        // First attempt plus three retries
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4)
            .mount(&server)
            .await;

        let yesno = YesNoClient::new(fast_client(), server.uri());
        let err = yesno.fetch_content().await.expect_err("budget exhausted");
        assert!(matches!(err, ContentError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn test_client_errors_fail_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/generate_insult.php"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let insult = InsultClient::new(fast_client(), server.uri());
        let err = insult.fetch_content().await.expect_err("404 is final");
        assert!(matches!(err, ContentError::Status(s) if s.as_u16() == 404));
    }

    #[tokio::test]
    async fn test_transient_blip_recovers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "no",
                "image": "https://yesno.example/no.gif"
            })))
            .mount(&server)
            .await;

        let yesno = YesNoClient::new(fast_client(), server.uri());
        let content = yesno.fetch_content().await.expect("third attempt lands");
        assert!(matches!(content, ContentRef::Video { .. }));
    }
}
