//! Point lookups and state writes on the roster.

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{Candidate, EngineError, ResultEngine, RosterEntry, roster};

use super::{Engine, with_tx};

impl Engine {
    /// Return the roster entry for an identity, if any.
    pub async fn entry(&self, user_id: i64) -> ResultEngine<Option<RosterEntry>> {
        with_tx!(self, |db_tx| {
            roster::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await
                .map_err(EngineError::from)
        })
    }

    /// Return the roster entry owning a linked channel, if any.
    pub async fn entry_by_channel(&self, channel_id: i64) -> ResultEngine<Option<RosterEntry>> {
        with_tx!(self, |db_tx| {
            roster::Entity::find()
                .filter(roster::Column::ChannelId.eq(channel_id))
                .one(&db_tx)
                .await
                .map_err(EngineError::from)
        })
    }

    /// Return the linked channel for an identity. `None` both when the
    /// identity is not on the roster and when it has no channel yet.
    pub async fn channel_for(&self, user_id: i64) -> ResultEngine<Option<i64>> {
        Ok(self.entry(user_id).await?.and_then(|entry| entry.channel_id))
    }

    /// All entries that currently have a linked channel.
    pub async fn linked_entries(&self) -> ResultEngine<Vec<RosterEntry>> {
        with_tx!(self, |db_tx| {
            roster::Entity::find()
                .filter(roster::Column::ChannelId.is_not_null())
                .all(&db_tx)
                .await
                .map_err(EngineError::from)
        })
    }

    /// All entries eligible for provisioning: authorized by the feed
    /// and not yet linked to a channel.
    pub async fn provision_candidates(&self) -> ResultEngine<Vec<Candidate>> {
        with_tx!(self, |db_tx| {
            Self::candidates_in(&db_tx).await
        })
    }

    pub(super) async fn candidates_in(
        db_tx: &sea_orm::DatabaseTransaction,
    ) -> ResultEngine<Vec<Candidate>> {
        let models = roster::Entity::find()
            .filter(roster::Column::Active.eq(true))
            .filter(roster::Column::ChannelId.is_null())
            .all(db_tx)
            .await?;

        Ok(models
            .into_iter()
            .map(|model| Candidate {
                username: model.username,
                user_id: model.user_id,
            })
            .collect())
    }

    /// Record the channel provisioned for an identity. This is the
    /// only write path that populates `channel_id`.
    pub async fn link_channel(&self, user_id: i64, channel_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = roster::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;

            let mut entry: roster::ActiveModel = model.into();
            entry.channel_id = ActiveValue::Set(Some(channel_id));
            entry.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Flip the open/closed conversation state of a linked entry.
    pub async fn set_open(&self, user_id: i64, open: bool) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = roster::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;

            let mut entry: roster::ActiveModel = model.into();
            entry.open = ActiveValue::Set(open);
            entry.update(&db_tx).await?;
            Ok(())
        })
    }
}
