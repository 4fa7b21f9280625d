//! Database configuration module.
//!
//! Handles `SQLite` database connection and table creation using `SeaORM`.
//! Table creation uses `Schema::create_table_from_entity` so the schema is
//! generated from the entity definitions without hand-written SQL.

use crate::entities::{Group, Membership, Notification, Transaction, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Default local database file, used when `TAKAFUL_DATABASE_URL` is not set.
/// `mode=rwc` lets `SQLite` create the file on first run.
const DEFAULT_DATABASE_URL: &str = "sqlite://data/takaful.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default
/// `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("TAKAFUL_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `TAKAFUL_DATABASE_URL`,
/// falling back to a default local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all necessary database tables from the entity definitions.
///
/// The `DeriveEntityModel` macros supply the schema, so the database always
/// matches the Rust struct definitions. Creates tables for users, groups,
/// memberships, transactions, and notifications.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Group),
        schema.create_table_from_entity(Membership),
        schema.create_table_from_entity(Transaction),
        schema.create_table_from_entity(Notification),
    ];

    // if_not_exists keeps startup idempotent across restarts
    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    Ok(())
}
