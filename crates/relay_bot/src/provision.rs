//! Channel provisioning.
//!
//! One private channel per eligible roster entry, created under the
//! closed grouping and handed to the entry's owner via a permission
//! override. Linking the channel back into the roster is the only
//! write path that populates `channel_id`.

use engine::Candidate;

use crate::{
    error::BotError,
    gateway::{Gateway, PermissionOverride},
    router::Router,
};

impl<G: Gateway> Router<G> {
    /// Provision channels for the candidates, sequentially. Returns
    /// the successfully linked ones.
    ///
    /// Per-candidate failures are isolated: a creation error skips
    /// that candidate, and a creation that succeeds but fails to link
    /// leaves an orphan channel behind for manual cleanup.
    pub(crate) async fn provision(
        &self,
        candidates: &[Candidate],
    ) -> Result<Vec<(Candidate, i64)>, BotError> {
        let mut provisioned = Vec::new();

        for candidate in candidates {
            let overrides = [PermissionOverride {
                user_id: candidate.user_id,
                allow: vec!["view_channel".to_string(), "send_messages".to_string()],
            }];

            let channel_id = match self
                .gateway
                .create_channel(
                    self.cfg.closed_grouping,
                    &channel_name(&candidate.username),
                    &overrides,
                )
                .await
            {
                Ok(id) => id,
                Err(err) => {
                    tracing::error!(
                        user_id = candidate.user_id,
                        error = %err,
                        "failed to create channel for candidate"
                    );
                    continue;
                }
            };

            if let Err(err) = self.engine.link_channel(candidate.user_id, channel_id).await {
                tracing::error!(
                    user_id = candidate.user_id,
                    channel_id,
                    error = %err,
                    "channel created but linkage write failed; orphan channel needs manual cleanup"
                );
                continue;
            }

            tracing::info!(
                user_id = candidate.user_id,
                channel_id,
                username = %candidate.username,
                "provisioned support channel"
            );
            provisioned.push((candidate.clone(), channel_id));
        }

        Ok(provisioned)
    }
}

/// Channel names derive deterministically from the username; the
/// platform's own naming rules apply beyond this normalization.
fn channel_name(username: &str) -> String {
    username
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::channel_name;

    #[test]
    fn channel_names_are_deterministic_slugs() {
        assert_eq!(channel_name("Alice"), "alice");
        assert_eq!(channel_name("  Mario Rossi "), "mario-rossi");
    }
}
