//! Shared test utilities for `TakafulLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{group, ledger::Ledger, transaction, user},
    entities,
    errors::Result,
};
use chrono::Duration;
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates the seeded administrator account ("admin").
pub async fn create_test_admin(db: &DatabaseConnection) -> Result<entities::user::Model> {
    user::seed_admin(db, "admin", "admin@example.com", "test-hash").await
}

/// Creates a regular member with an email derived from the name.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    user::register_user(db, name, &format!("{name}@example.com"), "test-hash").await
}

/// Creates a test group with a monthly contribution of 10.
pub async fn create_test_group(
    db: &DatabaseConnection,
    name: &str,
    created_by: i64,
) -> Result<entities::group::Model> {
    group::create_group(db, name, None, 10, created_by).await
}

/// Creates a test group with a custom monthly contribution.
pub async fn create_custom_group(
    db: &DatabaseConnection,
    name: &str,
    monthly_contribution: i64,
    created_by: i64,
) -> Result<entities::group::Model> {
    group::create_group(db, name, None, monthly_contribution, created_by).await
}

/// A ledger engine with the default 2% commission rate.
#[must_use]
pub const fn test_ledger() -> Ledger {
    Ledger::new(0.02)
}

/// Approves a transaction using the default test ledger.
pub async fn approve_test_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<entities::transaction::Model> {
    transaction::approve_transaction(db, &test_ledger(), transaction_id).await
}

/// Rewrites a transaction's creation timestamp `age` into the past, for
/// exercising the scheduler's due window.
pub async fn backdate_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
    age: Duration,
) -> Result<()> {
    let found = entities::Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(crate::errors::Error::TransactionNotFound { id: transaction_id })?;

    let mut active: entities::transaction::ActiveModel = found.into();
    active.created_at = Set(chrono::Utc::now() - age);
    active.update(db).await?;
    Ok(())
}

/// Sets up a complete test environment: seeded admin, one member ("amina"),
/// and a group ("solidarity", monthly 10) created by the admin that the
/// member has joined. Returns (db, admin, member, group).
pub async fn setup_with_group() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::user::Model,
    entities::group::Model,
)> {
    setup_with_members(10).await
}

/// Same environment as [`setup_with_group`] but with a custom monthly
/// contribution amount.
pub async fn setup_with_members(
    monthly_contribution: i64,
) -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::user::Model,
    entities::group::Model,
)> {
    let db = setup_test_db().await?;
    let admin = create_test_admin(&db).await?;
    let member = create_test_user(&db, "amina").await?;
    let created = create_custom_group(&db, "solidarity", monthly_contribution, admin.id).await?;
    group::join_group(&db, created.id, member.id).await?;
    Ok((db, admin, member, created))
}
