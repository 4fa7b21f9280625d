//! Transaction entity - The ledger's atomic unit.
//!
//! A transaction records a contribution into or an aid payout out of a group's
//! fund. Rows are immutable once created except for the single status
//! transition (`pending` to `approved` or `rejected`) performed by an
//! administrator or a payment-capture callback. `provider` and `external_id`
//! tag contributions that were started through an external checkout flow.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The two kinds of ledger entries
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TransactionKind {
    /// Fixed periodic payment into the group's fund
    #[sea_orm(string_value = "contribution")]
    Contribution,
    /// Discretionary payout request drawn from the group's fund
    #[sea_orm(string_value = "aid")]
    Aid,
}

/// Lifecycle status; `approved` and `rejected` are terminal
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum TransactionStatus {
    /// Awaiting administrator review or a provider capture
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Counted by the ledger engine
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined; never counted
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group whose fund this entry affects
    pub group_id: i64,
    /// User the entry is attributed to
    pub user_id: i64,
    /// Amount in whole currency units; always positive, the kind gives the sign
    pub amount: i64,
    /// `contribution` or `aid`
    pub kind: TransactionKind,
    /// `pending`, `approved`, or `rejected`
    pub status: TransactionStatus,
    /// Free-text justification, aid requests only
    pub reason: Option<String>,
    /// When the transaction was created
    pub created_at: DateTimeUtc,
    /// Payment provider tag for external checkout flows (e.g. "stripe")
    pub provider: Option<String>,
    /// Provider-side reference id, matched by the capture callback
    pub external_id: Option<String>,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    /// Each transaction is attributed to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
