//! Notification entity - Append-only event fan-out to users.
//!
//! Every state-changing operation appends a notification for the affected user
//! (and, for most events, for every administrator). Rows are never mutated
//! except for the read flag, making the table an audit trail of ledger events.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier for the notification
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Addressee
    pub user_id: i64,
    /// Group the event relates to, if any
    pub group_id: Option<i64>,
    /// Event kind tag (e.g. `"aid_approved"`, `"contribution_due"`)
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// When the event occurred
    pub created_at: DateTimeUtc,
    /// Whether the addressee has seen it
    pub read: bool,
}

/// Defines relationships between Notification and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each notification is addressed to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each notification may be scoped to one group
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
