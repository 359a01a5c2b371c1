//! Feed reconciliation.
//!
//! A synchronization pass diffs parsed feed rows against the roster
//! table and applies insert/update mutations in one transaction. The
//! pass is idempotent: replaying the same feed yields an empty change
//! log.

use std::collections::HashMap;

use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{Candidate, Change, ChangeKind, FeedRow, ResultEngine, roster};

use super::{Engine, with_tx};

impl Engine {
    /// Reconcile the roster against a batch of feed rows.
    ///
    /// Returns the provisioning candidates computed over the *full*
    /// table (entries untouched by this batch included) and the change
    /// log for the batch. Only `username` and `active` are ever
    /// written here; `channel_id` and `open` belong to the provisioner
    /// and the relay.
    pub async fn synchronize(
        &self,
        rows: &[FeedRow],
    ) -> ResultEngine<(Vec<Candidate>, Vec<Change>)> {
        with_tx!(self, |db_tx| {
            let mut existing: HashMap<i64, roster::Model> = roster::Entity::find()
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| (model.user_id, model))
                .collect();

            let mut changes = Vec::new();

            for row in rows {
                match existing.get(&row.user_id) {
                    None => {
                        let entry = roster::ActiveModel {
                            user_id: ActiveValue::Set(row.user_id),
                            username: ActiveValue::Set(row.username.clone()),
                            channel_id: ActiveValue::Set(None),
                            open: ActiveValue::Set(false),
                            active: ActiveValue::Set(row.active),
                        };
                        let model = entry.insert(&db_tx).await?;

                        tracing::debug!(user_id = row.user_id, username = %row.username, "roster insert");
                        changes.push(Change {
                            username: row.username.clone(),
                            user_id: row.user_id,
                            kind: ChangeKind::Inserted,
                        });
                        // A repeated id later in the same batch is a diff
                        // against this row, not a second insert.
                        existing.insert(row.user_id, model);
                    }
                    Some(model) => {
                        if model.username == row.username && model.active == row.active {
                            continue;
                        }

                        let mut entry: roster::ActiveModel = model.clone().into();
                        entry.username = ActiveValue::Set(row.username.clone());
                        entry.active = ActiveValue::Set(row.active);
                        let model = entry.update(&db_tx).await?;

                        tracing::debug!(user_id = row.user_id, username = %row.username, "roster update");
                        changes.push(Change {
                            username: row.username.clone(),
                            user_id: row.user_id,
                            kind: ChangeKind::Updated,
                        });
                        existing.insert(row.user_id, model);
                    }
                }
            }

            let candidates = Self::candidates_in(&db_tx).await?;
            Ok((candidates, changes))
        })
    }
}
