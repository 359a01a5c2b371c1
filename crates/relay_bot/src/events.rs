//! Inbound events from the chat platform.
//!
//! The platform delivers one logical stream of events; each poll
//! returns a batch in delivery order together with the next cursor.

use serde::{Deserialize, Serialize};

/// A file attached to a message, referenced by URL. Forwarded
/// verbatim when a message is relayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

/// A message the bot can see: either a direct message to the bot
/// (`direct = true`) or a message posted in a guild channel.
#[derive(Clone, Debug, Deserialize)]
pub struct InboundMessage {
    pub author_id: i64,
    pub author_name: String,
    pub channel_id: i64,
    pub direct: bool,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// An operator command invocation, delivered by the platform with the
/// caller's resolved role names and any user mentions in the
/// arguments.
#[derive(Clone, Debug, Deserialize)]
pub struct CommandInvocation {
    pub verb: String,
    #[serde(default)]
    pub args: String,
    pub caller_id: i64,
    pub caller_name: String,
    #[serde(default)]
    pub caller_roles: Vec<String>,
    pub channel_id: i64,
    #[serde(default)]
    pub mentions: Vec<i64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Message(InboundMessage),
    Command(CommandInvocation),
}

/// One poll result: the events since the cursor, plus the new cursor.
#[derive(Clone, Debug, Deserialize)]
pub struct EventBatch {
    #[serde(default)]
    pub events: Vec<Event>,
    pub cursor: u64,
}
