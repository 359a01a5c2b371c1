//! Outbound calls to the chat platform.
//!
//! The bot is a thin client: every platform mutation goes through the
//! [`Gateway`] trait so the routing logic never depends on the wire
//! client. [`PlatformClient`] is the HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::events::{Attachment, EventBatch};

/// A message the bot sends, with any attachments preserved from the
/// relayed original.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            attachments: Vec::new(),
        }
    }
}

/// Per-user permission grant applied when creating a support channel,
/// so the channel is private to its owner and the operators.
#[derive(Clone, Debug, Serialize)]
pub struct PermissionOverride {
    pub user_id: i64,
    pub allow: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The recipient's privacy settings reject the message.
    #[error("recipient refuses messages")]
    Forbidden,
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// The bot's own platform identity, used to ignore self-echoes.
    async fn identify(&self) -> Result<i64, GatewayError>;

    async fn send_direct(
        &self,
        user_id: i64,
        message: &OutboundMessage,
    ) -> Result<(), GatewayError>;

    async fn send_to_channel(
        &self,
        channel_id: i64,
        message: &OutboundMessage,
    ) -> Result<(), GatewayError>;

    /// Create a private channel under a grouping, returning its id.
    async fn create_channel(
        &self,
        grouping_id: i64,
        name: &str,
        overrides: &[PermissionOverride],
    ) -> Result<i64, GatewayError>;

    /// Recategorize a channel under another grouping.
    async fn move_channel(&self, channel_id: i64, grouping_id: i64) -> Result<(), GatewayError>;
}

#[derive(Clone, Debug)]
pub struct PlatformClient {
    client: Client,
    base_url: String,
    guild_id: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ChannelCreated {
    channel_id: i64,
}

#[derive(Debug, Deserialize)]
struct Identity {
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct ChannelCreate<'a> {
    name: &'a str,
    grouping_id: i64,
    overrides: &'a [PermissionOverride],
}

#[derive(Debug, Serialize)]
struct ChannelMove {
    grouping_id: i64,
}

impl PlatformClient {
    pub fn new(client: Client, base_url: String, guild_id: i64) -> Self {
        Self {
            client,
            base_url,
            guild_id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Long-poll the event stream. Blocks server-side until events are
    /// available or the platform's own timeout elapses.
    pub async fn poll_events(&self, cursor: u64) -> Result<EventBatch, GatewayError> {
        let resp = self
            .client
            .get(self.url("/gateway/events"))
            .query(&[("after", cursor)])
            .send()
            .await?;
        Self::check(resp).await?.json().await.map_err(Into::into)
    }

    async fn post_json<TReq: Serialize + ?Sized, TResp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TResp, GatewayError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::check(resp).await?.json().await.map_err(Into::into)
    }

    async fn post_json_unit<TReq: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<(), GatewayError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Forbidden);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "server error".to_string(),
        };
        Err(GatewayError::Server { status, message })
    }
}

#[async_trait]
impl Gateway for PlatformClient {
    async fn identify(&self) -> Result<i64, GatewayError> {
        let resp = self.client.get(self.url("/gateway/self")).send().await?;
        let identity: Identity = Self::check(resp).await?.json().await?;
        Ok(identity.user_id)
    }

    async fn send_direct(
        &self,
        user_id: i64,
        message: &OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.post_json_unit(&format!("/users/{user_id}/messages"), message)
            .await
    }

    async fn send_to_channel(
        &self,
        channel_id: i64,
        message: &OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.post_json_unit(&format!("/channels/{channel_id}/messages"), message)
            .await
    }

    async fn create_channel(
        &self,
        grouping_id: i64,
        name: &str,
        overrides: &[PermissionOverride],
    ) -> Result<i64, GatewayError> {
        let created: ChannelCreated = self
            .post_json(
                &format!("/guilds/{}/channels", self.guild_id),
                &ChannelCreate {
                    name,
                    grouping_id,
                    overrides,
                },
            )
            .await?;
        Ok(created.channel_id)
    }

    async fn move_channel(&self, channel_id: i64, grouping_id: i64) -> Result<(), GatewayError> {
        self.post_json_unit(
            &format!("/channels/{channel_id}/move"),
            &ChannelMove { grouping_id },
        )
        .await
    }
}
