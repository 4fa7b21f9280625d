//! User entity - Platform identities with a role and anti-brute-force state.
//!
//! Each user has a unique name and email, an opaque credential hash, and a role
//! (`member` or `admin`). Failed-attempt bookkeeping (`failed_attempts`,
//! `lock_until`, `is_blocked`) is carried as data; the login mechanics that
//! mutate it live in the outer web layer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role a user holds on the platform
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum UserRole {
    /// Regular member: joins groups, contributes, requests aid
    #[sea_orm(string_value = "member")]
    Member,
    /// Administrator: reviews transactions, manages groups and users
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique display name
    #[sea_orm(unique)]
    pub name: String,
    /// Unique email address
    #[sea_orm(unique)]
    pub email: String,
    /// Opaque credential hash; verification happens in the outer auth layer
    pub password_hash: String,
    /// Role: `member` or `admin`
    pub role: UserRole,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// Consecutive failed login attempts since the last success
    pub failed_attempts: i32,
    /// Temporary lock expiry after repeated failures, if any
    pub lock_until: Option<DateTimeUtc>,
    /// Permanent block flag set by an administrator or the lockout policy
    pub is_blocked: bool,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many memberships
    #[sea_orm(has_many = "super::membership::Entity")]
    Memberships,
    /// One user has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One user has many notifications
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
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

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
