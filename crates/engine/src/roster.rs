//! Roster table (one row per authorized identity).
//!
//! `channel_id` is populated only by channel provisioning and `open`
//! only by the relay/command layer; the synchronizer never writes
//! either column. Rows are never deleted, only deactivated.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "roster")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub username: String,
    pub channel_id: Option<i64>,
    pub open: bool,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
