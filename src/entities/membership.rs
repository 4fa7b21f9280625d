//! Membership entity - The join relation between a user and a group.
//!
//! At most one membership exists per (user, group) pair; the registry enforces
//! this at join time. The `auto_pay` flag opts the member into the recurring
//! contribution sweep. The `balance` column is a legacy per-member counter that
//! the canonical ledger calculation never consults.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Membership database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "memberships")]
pub struct Model {
    /// Unique identifier for the membership
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member user
    pub user_id: i64,
    /// Group joined
    pub group_id: i64,
    /// Legacy internal counter; not part of the authoritative ledger
    pub balance: i64,
    /// When the user joined the group
    pub joined_at: DateTimeUtc,
    /// Whether the recurring sweep generates contribution obligations
    pub auto_pay: bool,
}

/// Defines relationships between Membership and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each membership belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each membership belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
