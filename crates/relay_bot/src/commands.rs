//! Operator command surface.

/// The four operator-gated actions. Anything else the platform sends
/// as a command invocation is ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Close the conversation the command was issued in.
    Close,
    /// Synchronize the roster from the feed, then provision channels.
    Sync,
    /// Direct-message every mentioned user.
    Dm { message: String },
    /// Direct-message every linked roster entry.
    DmAll { message: String },
}

impl OperatorCommand {
    pub fn parse(verb: &str, args: &str) -> Option<Self> {
        match verb {
            "close" => Some(Self::Close),
            "sync" => Some(Self::Sync),
            "dm" => Some(Self::Dm {
                message: strip_mentions(args),
            }),
            "dmall" => Some(Self::DmAll {
                message: args.trim().to_string(),
            }),
            _ => None,
        }
    }
}

/// Drop `<@id>` mention tokens from the argument text, leaving the
/// literal message to deliver.
fn strip_mentions(args: &str) -> String {
    args.split_whitespace()
        .filter(|token| !(token.starts_with("<@") && token.ends_with('>')))
        .collect::<Vec<_>>()
        .join(" ")
}
