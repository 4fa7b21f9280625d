//! Group entity - A named mutual-aid pool.
//!
//! Each group carries a fixed monthly contribution amount and an `archived`
//! flag. Archived groups accept no new joins or contributions but keep their
//! transaction history, so the computed balance is unaffected. The spendable
//! balance is never stored here; it is derived on demand by the ledger engine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    /// Unique identifier for the group
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique human-readable name of the pool
    #[sea_orm(unique)]
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Fixed monthly contribution amount, in whole currency units
    pub monthly_contribution: i64,
    /// User who created the group
    pub created_by: i64,
    /// When the group was created
    pub created_at: DateTimeUtc,
    /// Suspended flag: archived groups block new joins and contributions
    pub archived: bool,
}

/// Defines relationships between Group and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each group was created by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    /// One group has many memberships
    #[sea_orm(has_many = "super::membership::Entity")]
    Memberships,
    /// One group has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
