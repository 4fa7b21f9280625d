//! User registration, bootstrap seeding, and admin user actions.
//!
//! Registration always produces a regular member; the one admin account comes
//! from the explicit [`seed_admin`] step run at startup, never from ambient
//! logic inside registration. Credential hashes are opaque strings here; the
//! outer auth layer owns hashing and verification.

use crate::{
    entities::{Group, Membership, Notification, Transaction, User, group, membership,
        notification, transaction, user},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};

/// Registers a new member account with a unique name and email.
///
/// The email is normalized to lowercase before the uniqueness check, matching
/// how logins look accounts up. Role is always `member`; see [`seed_admin`]
/// for the bootstrap admin.
pub async fn register_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<user::Model> {
    let name = name.trim();
    let email = email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }

    ensure_identity_free(db, name, &email).await?;

    let model = user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email),
        password_hash: Set(password_hash.to_string()),
        role: Set(user::UserRole::Member),
        created_at: Set(chrono::Utc::now()),
        failed_attempts: Set(0),
        lock_until: Set(None),
        is_blocked: Set(false),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Seeds the administrator account if none exists yet.
///
/// This is the one-time bootstrap rule made explicit: run at startup, it
/// creates the admin on a fresh store and is a no-op (returning the existing
/// admin) on every later run.
pub async fn seed_admin(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<user::Model> {
    let existing = User::find()
        .filter(user::Column::Role.eq(user::UserRole::Admin))
        .one(db)
        .await?;
    if let Some(admin) = existing {
        return Ok(admin);
    }

    let name = name.trim();
    let email = email.trim().to_lowercase();
    ensure_identity_free(db, name, &email).await?;

    let model = user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email),
        password_hash: Set(password_hash.to_string()),
        role: Set(user::UserRole::Admin),
        created_at: Set(chrono::Utc::now()),
        failed_attempts: Set(0),
        lock_until: Set(None),
        is_blocked: Set(false),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Fails with [`Error::DuplicateName`] if the name or email is taken.
async fn ensure_identity_free(db: &DatabaseConnection, name: &str, email: &str) -> Result<()> {
    let by_name = User::find()
        .filter(user::Column::Name.eq(name))
        .one(db)
        .await?;
    let by_email = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    if by_name.is_some() || by_email.is_some() {
        return Err(Error::DuplicateName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Finds a user by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by display name.
pub async fn get_user_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Permanently blocks a user (admin action).
pub async fn block_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let found = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let mut active: user::ActiveModel = found.into();
    active.is_blocked = Set(true);
    active.update(db).await.map_err(Into::into)
}

/// Unblocks a user and clears their lockout state (admin action).
pub async fn unblock_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let found = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let mut active: user::ActiveModel = found.into();
    active.is_blocked = Set(false);
    active.failed_attempts = Set(0);
    active.lock_until = Set(None);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a user account and everything it is party to: memberships,
/// transactions, and notifications. Groups the user created are removed the
/// same way, dependents included, since their creator reference cannot
/// outlive the account. One store transaction, irreversible.
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let found = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let created_groups = Group::find()
        .filter(group::Column::CreatedBy.eq(user_id))
        .all(&txn)
        .await?;
    for created in created_groups {
        crate::core::group::delete_group_rows(&txn, created.id).await?;
    }

    Notification::delete_many()
        .filter(notification::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    Transaction::delete_many()
        .filter(transaction::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    Membership::delete_many()
        .filter(membership::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    found.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}
