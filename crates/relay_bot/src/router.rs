//! Event router.
//!
//! Maps each inbound event to its handler with the engine, gateway
//! and configuration as explicit dependencies. Relay transitions
//! follow a fixed order: recategorize the channel and flip `open`
//! first, then forward the message. Move and forward are independent
//! best-effort steps, never a transaction.

use engine::{Engine, FeedRow};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    commands::OperatorCommand,
    error::BotError,
    events::{CommandInvocation, Event, InboundMessage},
    feed,
    gateway::{Gateway, GatewayError, OutboundMessage},
};

/// What to do with a direct message from an identity that has no
/// linked channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlinkedPolicy {
    /// Drop the message silently.
    #[default]
    Ignore,
    /// Tell the sender they are not on the roster.
    Notify,
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Grouping for channels with an active conversation.
    pub open_grouping: i64,
    /// Grouping channels are provisioned into and archived back to.
    pub closed_grouping: i64,
    /// Role required to invoke operator commands.
    pub operator_role: String,
    /// The CSV roster feed.
    pub feed_url: String,
    pub unlinked_policy: UnlinkedPolicy,
}

pub struct Router<G> {
    pub(crate) engine: Engine,
    pub(crate) gateway: G,
    http: Client,
    pub(crate) cfg: RelayConfig,
    self_id: i64,
}

impl<G: Gateway> Router<G> {
    pub fn new(engine: Engine, gateway: G, http: Client, cfg: RelayConfig, self_id: i64) -> Self {
        Self {
            engine,
            gateway,
            http,
            cfg,
            self_id,
        }
    }

    pub async fn dispatch(&self, event: Event) -> Result<(), BotError> {
        match event {
            Event::Message(msg) if msg.author_id == self.self_id => Ok(()),
            Event::Message(msg) if msg.direct => self.relay_direct(msg).await,
            Event::Message(msg) => self.relay_channel(msg).await,
            Event::Command(cmd) => self.handle_command(cmd).await,
        }
    }

    /// DM from a user: open their linked channel and forward into it.
    async fn relay_direct(&self, msg: InboundMessage) -> Result<(), BotError> {
        let Some(channel_id) = self.engine.channel_for(msg.author_id).await? else {
            return self.reject_unlinked(&msg).await;
        };

        self.open_conversation(msg.author_id, channel_id).await?;
        self.gateway
            .send_to_channel(channel_id, &forwarded(&msg))
            .await?;
        Ok(())
    }

    /// Message in a roster-linked channel: open it and forward to the
    /// owning user's DM. Messages in unrelated channels are not ours.
    async fn relay_channel(&self, msg: InboundMessage) -> Result<(), BotError> {
        let Some(entry) = self.engine.entry_by_channel(msg.channel_id).await? else {
            return Ok(());
        };

        self.open_conversation(entry.user_id, msg.channel_id).await?;
        match self.gateway.send_direct(entry.user_id, &forwarded(&msg)).await {
            Ok(()) => Ok(()),
            Err(GatewayError::Forbidden) => {
                tracing::warn!(user_id = entry.user_id, "user refuses direct messages");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The shared transition into `Linked-Open`. The channel move is
    /// best-effort: a platform failure there must not hold back the
    /// forward.
    async fn open_conversation(&self, user_id: i64, channel_id: i64) -> Result<(), BotError> {
        if let Err(err) = self
            .gateway
            .move_channel(channel_id, self.cfg.open_grouping)
            .await
        {
            tracing::warn!(channel_id, error = %err, "failed to move channel to open grouping");
        }
        self.engine.set_open(user_id, true).await?;
        Ok(())
    }

    async fn reject_unlinked(&self, msg: &InboundMessage) -> Result<(), BotError> {
        match self.cfg.unlinked_policy {
            UnlinkedPolicy::Ignore => {
                tracing::debug!(author_id = msg.author_id, "ignoring DM from unlinked identity");
                Ok(())
            }
            UnlinkedPolicy::Notify => {
                let notice = OutboundMessage::text(
                    "You are not on the support roster, so this message cannot be delivered.",
                );
                match self.gateway.send_direct(msg.author_id, &notice).await {
                    Ok(()) | Err(GatewayError::Forbidden) => Ok(()),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    async fn handle_command(&self, cmd: CommandInvocation) -> Result<(), BotError> {
        let Some(command) = OperatorCommand::parse(&cmd.verb, &cmd.args) else {
            tracing::debug!(verb = %cmd.verb, "ignoring unknown command");
            return Ok(());
        };

        if !cmd.caller_roles.iter().any(|r| r == &self.cfg.operator_role) {
            self.gateway
                .send_to_channel(
                    cmd.channel_id,
                    &OutboundMessage::text("You do not have the required role to use this command."),
                )
                .await?;
            return Err(BotError::PermissionDenied(self.cfg.operator_role.clone()));
        }

        match command {
            OperatorCommand::Close => self.close(&cmd).await,
            OperatorCommand::Sync => self.sync(&cmd).await,
            OperatorCommand::Dm { message } => self.dm(&cmd, &message).await,
            OperatorCommand::DmAll { message } => self.dm_all(&cmd, &message).await,
        }
    }

    /// `close`: archive the conversation the command was issued in.
    async fn close(&self, cmd: &CommandInvocation) -> Result<(), BotError> {
        let Some(entry) = self.engine.entry_by_channel(cmd.channel_id).await? else {
            self.gateway
                .send_to_channel(
                    cmd.channel_id,
                    &OutboundMessage::text("This channel is not linked to a roster user."),
                )
                .await?;
            return Ok(());
        };

        if let Err(err) = self
            .gateway
            .move_channel(cmd.channel_id, self.cfg.closed_grouping)
            .await
        {
            tracing::warn!(channel_id = cmd.channel_id, error = %err, "failed to move channel to closed grouping");
        }
        self.engine.set_open(entry.user_id, false).await?;

        let notice = OutboundMessage::text(format!(
            "{} has closed this conversation. To open again, please send a DM.",
            cmd.caller_name
        ));
        match self.gateway.send_direct(entry.user_id, &notice).await {
            Ok(()) => {}
            Err(GatewayError::Forbidden) => {
                tracing::warn!(user_id = entry.user_id, "user refuses direct messages");
            }
            Err(err) => return Err(err.into()),
        }

        self.gateway
            .send_to_channel(
                cmd.channel_id,
                &OutboundMessage::text("Channel has been closed and user notified."),
            )
            .await?;
        Ok(())
    }

    /// `sync`: fetch the feed, reconcile the roster, provision
    /// channels for new candidates and report back.
    async fn sync(&self, cmd: &CommandInvocation) -> Result<(), BotError> {
        self.gateway
            .send_to_channel(cmd.channel_id, &OutboundMessage::text("Syncing roster..."))
            .await?;

        let rows = match feed::fetch(&self.http, &self.cfg.feed_url).await {
            Ok(rows) => rows,
            Err(err @ BotError::FeedFetch(_)) => {
                self.gateway
                    .send_to_channel(
                        cmd.channel_id,
                        &OutboundMessage::text("Failed to fetch the roster feed. Sync skipped."),
                    )
                    .await?;
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        self.sync_from_rows(&rows, cmd.channel_id).await
    }

    /// The fetch-independent tail of `sync`, also the seam the tests
    /// drive directly.
    pub async fn sync_from_rows(
        &self,
        rows: &[FeedRow],
        report_channel: i64,
    ) -> Result<(), BotError> {
        let (candidates, changes) = self.engine.synchronize(rows).await?;

        if candidates.is_empty() && changes.is_empty() {
            self.gateway
                .send_to_channel(
                    report_channel,
                    &OutboundMessage::text("Roster is already up to date."),
                )
                .await?;
            return Ok(());
        }

        let provisioned = self.provision(&candidates).await?;
        for (candidate, channel_id) in &provisioned {
            self.gateway
                .send_to_channel(
                    report_channel,
                    &OutboundMessage::text(format!(
                        "Created channel {channel_id} for user {}.",
                        candidate.username
                    )),
                )
                .await?;
        }

        let mut report = String::from("Roster synced.");
        for change in &changes {
            report.push_str(&format!(
                "\nUser: {}, ID: {}, Change: {}",
                change.username, change.user_id, change.kind
            ));
        }
        self.gateway
            .send_to_channel(report_channel, &OutboundMessage::text(report))
            .await?;
        Ok(())
    }

    /// `dm`: deliver a literal message to each mentioned user,
    /// isolating per-recipient failures.
    async fn dm(&self, cmd: &CommandInvocation, message: &str) -> Result<(), BotError> {
        if cmd.mentions.is_empty() {
            self.gateway
                .send_to_channel(
                    cmd.channel_id,
                    &OutboundMessage::text("You need to mention at least one user."),
                )
                .await?;
            return Ok(());
        }

        let body = OutboundMessage::text(message);
        for &user_id in &cmd.mentions {
            match self.gateway.send_direct(user_id, &body).await {
                Ok(()) => {
                    self.gateway
                        .send_to_channel(
                            cmd.channel_id,
                            &OutboundMessage::text(format!("Message sent to {user_id}.")),
                        )
                        .await?;
                }
                Err(GatewayError::Forbidden) => {
                    self.gateway
                        .send_to_channel(
                            cmd.channel_id,
                            &OutboundMessage::text(format!("Cannot send message to {user_id}.")),
                        )
                        .await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// `dmall`: broadcast to every linked roster entry, sequentially.
    async fn dm_all(&self, cmd: &CommandInvocation, message: &str) -> Result<(), BotError> {
        let body = OutboundMessage::text(message);
        let mut delivered = 0usize;

        for entry in self.engine.linked_entries().await? {
            match self.gateway.send_direct(entry.user_id, &body).await {
                Ok(()) => delivered += 1,
                Err(GatewayError::Forbidden) => {
                    self.gateway
                        .send_to_channel(
                            cmd.channel_id,
                            &OutboundMessage::text(format!(
                                "Cannot send message to {}.",
                                entry.username
                            )),
                        )
                        .await?;
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.gateway
            .send_to_channel(
                cmd.channel_id,
                &OutboundMessage::text(format!("Message sent to {delivered} linked users.")),
            )
            .await?;
        Ok(())
    }
}

fn forwarded(msg: &InboundMessage) -> OutboundMessage {
    OutboundMessage {
        body: format!("{}: {}", msg.author_name, msg.content),
        attachments: msg.attachments.clone(),
    }
}
