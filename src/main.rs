use banterbot::actions::{default_registry, ActionDeps, Dispatcher};
use banterbot::chat::{ChatClient, TelegramChatClient};
use banterbot::config::{self, Settings};
use banterbot::content::{
    create_http_client, BaconClient, ContentProvider, InspiroClient, InsultClient, MetaphorClient,
    ProviderPool, ResilientClient, YesNoClient,
};
use banterbot::cooldown::CooldownCache;
use banterbot::random::{RandomSource, StdRandom};
use banterbot::resilience::RetryPolicy;
use banterbot::server::{self, AppState};
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::signal;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use url::Url;

/// Regex patterns for redacting the bot token from log output
struct RedactionPatterns {
    token_in_url: Regex,
    bare_token: Regex,
    token_prefix: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_in_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            bare_token: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token_prefix: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token_in_url
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .bare_token
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token_prefix
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // We return the original buffer length to satisfy the contract,
        // even if the redacted string length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile redaction patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting banterbot...");

    let settings = init_settings();

    let bot = Bot::new(settings.telegram_token.clone());
    let client: Arc<dyn ChatClient> = Arc::new(TelegramChatClient::new(bot.clone()));
    let random: Arc<dyn RandomSource> = Arc::new(StdRandom::new());

    let deps = init_actions(&settings, client, random);
    let dispatcher = Arc::new(Dispatcher::new(default_registry(&deps)));
    info!("Action registry wired.");

    register_webhook(&bot, &settings).await;

    let tracker = TaskTracker::new();
    let state = AppState::new(
        dispatcher,
        tracker.clone(),
        settings.webhook_secret.clone(),
        Duration::from_secs(config::UPDATE_DEADLINE_SECS),
    );

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr)
        .await
        .map_err(|e| {
            error!("Failed to bind {}: {e}", settings.listen_addr);
            e
        })?;
    info!("Listening on {}", settings.listen_addr);

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight updates drain before exiting
    tracker.close();
    if tokio::time::timeout(
        Duration::from_secs(config::SHUTDOWN_GRACE_SECS),
        tracker.wait(),
    )
    .await
    .is_err()
    {
        warn!(
            "Shutdown grace period of {}s elapsed with updates still in flight",
            config::SHUTDOWN_GRACE_SECS
        );
    }

    info!("Bot stopped.");
    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    }
}

/// Wires every content client and shared collaborator the actions need.
///
/// Each content API gets its own retrying HTTP client so one slow or
/// broken upstream cannot poison the others.
fn init_actions(
    settings: &Settings,
    client: Arc<dyn ChatClient>,
    random: Arc<dyn RandomSource>,
) -> ActionDeps {
    let policy = RetryPolicy::new(
        config::CONTENT_MAX_RETRIES,
        Duration::from_secs(config::CONTENT_BACKOFF_BASE_SECS),
    );
    let resilient = || ResilientClient::new(create_http_client(), policy);

    let lipsum_members: Vec<Arc<dyn ContentProvider>> = vec![
        Arc::new(BaconClient::new(resilient(), settings.bacon_api_url.clone())),
        Arc::new(MetaphorClient::new(
            resilient(),
            settings.metaphor_api_url.clone(),
        )),
    ];
    let lipsum = Arc::new(ProviderPool::new(
        "lipsum",
        lipsum_members,
        Arc::clone(&random),
    ));

    ActionDeps {
        client,
        random,
        cooldowns: CooldownCache::new(config::COOLDOWN_CACHE_CAPACITY),
        trigger_window: Duration::from_secs(config::TRIGGER_COOLDOWN_SECS),
        lipsum,
        inspiro: Arc::new(InspiroClient::new(
            resilient(),
            settings.inspiro_api_url.clone(),
        )),
        insult: Arc::new(InsultClient::new(
            resilient(),
            settings.insult_api_url.clone(),
        )),
        yesno: Arc::new(YesNoClient::new(
            resilient(),
            settings.yesno_api_url.clone(),
        )),
    }
}

/// Points Telegram at our public webhook endpoint.
///
/// Registration failure is fatal: without a webhook the bot would sit
/// idle forever.
async fn register_webhook(bot: &Bot, settings: &Settings) {
    let endpoint = settings.webhook_endpoint();
    let url = match Url::parse(&endpoint) {
        Ok(url) => url,
        Err(e) => {
            error!("Invalid webhook endpoint {endpoint}: {e}");
            std::process::exit(1);
        }
    };

    let mut request = bot.set_webhook(url.clone());
    if let Some(secret) = &settings.webhook_secret {
        request = request.secret_token(secret.clone());
    }

    match request.await {
        Ok(_) => info!("Webhook registered at {url}"),
        Err(e) => {
            error!("Failed to register webhook: {e}");
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        () = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
