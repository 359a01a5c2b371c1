//! Support-ticket relay bot.
//!
//! Relays messages between a user's direct messages and their
//! dedicated private channel, and gives operators commands to
//! synchronize the roster, provision channels, close conversations
//! and broadcast messages. The roster itself lives in [`engine`];
//! this crate owns the platform boundary and the event routing.

use std::time::Duration;

use engine::Engine;
use reqwest::{Client, header};

pub use error::BotError;
pub use gateway::{Gateway, GatewayError, OutboundMessage, PermissionOverride, PlatformClient};
pub use router::{RelayConfig, Router, UnlinkedPolicy};

pub mod commands;
mod error;
pub mod events;
pub mod feed;
mod gateway;
mod provision;
mod router;

/// Pause before re-polling after a failed event poll.
const POLL_BACKOFF: Duration = Duration::from_secs(5);

pub struct Bot {
    engine: Engine,
    server: String,
    guild_id: i64,
    cfg: RelayConfig,
    client: Client,
}

impl Bot {
    pub fn new(
        token: &str,
        server: &str,
        guild_id: i64,
        engine: Engine,
        cfg: RelayConfig,
    ) -> Result<Self, String> {
        let mut auth = header::HeaderValue::try_from(format!("Bot {token}"))
            .map_err(|err| format!("invalid auth header value: {err}"))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        Ok(Self {
            engine,
            server: server.to_string(),
            guild_id,
            cfg,
            client,
        })
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    /// Run the relay bot until the process is terminated.
    ///
    /// Events are handled one at a time, in delivery order. Handler
    /// errors are logged and never stop the loop; only a failure to
    /// establish the bot's own identity is fatal.
    pub async fn run(&self) -> Result<(), BotError> {
        tracing::info!("Starting relay bot...");

        let gateway = PlatformClient::new(self.client.clone(), self.server.clone(), self.guild_id);
        let self_id = gateway.identify().await?;
        tracing::info!(self_id, "Connected to platform gateway");

        // The feed lives on another host; it must not see the bot token.
        let router = Router::new(
            self.engine.clone(),
            gateway.clone(),
            Client::new(),
            self.cfg.clone(),
            self_id,
        );

        let mut cursor = 0u64;
        loop {
            let batch = match gateway.poll_events(cursor).await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::error!(error = %err, "event poll failed");
                    tokio::time::sleep(POLL_BACKOFF).await;
                    continue;
                }
            };
            cursor = batch.cursor;

            for event in batch.events {
                match router.dispatch(event).await {
                    Ok(()) => {}
                    Err(err @ BotError::PermissionDenied(_)) => {
                        tracing::warn!("{err}");
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "event handler failed");
                    }
                }
            }
        }
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    server: String,
    guild_id: i64,
    engine: Option<Engine>,
    cfg: Option<RelayConfig>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn server(mut self, server: &str) -> BotBuilder {
        self.server = server.to_string();
        self
    }

    pub fn guild(mut self, guild_id: i64) -> BotBuilder {
        self.guild_id = guild_id;
        self
    }

    pub fn engine(mut self, engine: Engine) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn relay_config(mut self, cfg: RelayConfig) -> BotBuilder {
        self.cfg = Some(cfg);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing relay bot...");
        let engine = self.engine.ok_or("missing engine")?;
        let cfg = self.cfg.ok_or("missing relay configuration")?;
        Bot::new(&self.token, &self.server, self.guild_id, engine, cfg)
    }
}
