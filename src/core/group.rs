//! Membership and group registry operations.
//!
//! Groups are named mutual-aid pools with a fixed monthly contribution amount.
//! Joining is idempotent-guarded (one membership per (user, group) pair),
//! archiving blocks new joins and contributions without touching history, and
//! deletion cascades memberships, transactions, and notifications in one store
//! transaction.

use crate::{
    core::notification::{notify_admins, notify_user},
    entities::{
        Group, Membership, Notification, Transaction, User, group, membership, notification,
        transaction, user,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Creates a new group with a unique name and a positive monthly contribution.
/// The creator automatically becomes its first member.
pub async fn create_group(
    db: &DatabaseConnection,
    name: &str,
    description: Option<String>,
    monthly_contribution: i64,
    created_by: i64,
) -> Result<group::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }
    if monthly_contribution <= 0 {
        return Err(Error::InvalidAmount {
            amount: monthly_contribution,
        });
    }

    User::find_by_id(created_by)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: created_by })?;

    let existing = Group::find()
        .filter(group::Column::Name.eq(name))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::DuplicateName {
            name: name.to_string(),
        });
    }

    let txn = db.begin().await?;

    let created = group::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description),
        monthly_contribution: Set(monthly_contribution),
        created_by: Set(created_by),
        created_at: Set(chrono::Utc::now()),
        archived: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    // The creator joins their own pool
    membership::ActiveModel {
        user_id: Set(created_by),
        group_id: Set(created.id),
        balance: Set(0),
        joined_at: Set(chrono::Utc::now()),
        auto_pay: Set(true),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    notify_admins(
        db,
        "group_created",
        &format!("Group '{}' created", created.name),
        Some(created.id),
    )
    .await?;

    Ok(created)
}

/// Adds a user to a group.
///
/// Fails with [`Error::AlreadyMember`] if a membership already exists for the
/// pair and [`Error::GroupArchived`] if the group is suspended.
pub async fn join_group(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
) -> Result<membership::Model> {
    let found_group = Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;
    if found_group.archived {
        return Err(Error::GroupArchived { group_id });
    }

    let joining = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    if get_membership(db, group_id, user_id).await?.is_some() {
        return Err(Error::AlreadyMember { user_id, group_id });
    }

    let created = membership::ActiveModel {
        user_id: Set(user_id),
        group_id: Set(group_id),
        balance: Set(0),
        joined_at: Set(chrono::Utc::now()),
        auto_pay: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;

    notify_user(
        db,
        user_id,
        "group_join",
        &format!("You joined the group '{}'", found_group.name),
        Some(group_id),
    )
    .await?;
    notify_admins(
        db,
        "group_join",
        &format!("{} joined the group '{}'", joining.name, found_group.name),
        Some(group_id),
    )
    .await?;

    Ok(created)
}

/// Removes a user from a group. Fails with [`Error::NotMember`] when no
/// membership exists. Past transactions are untouched.
pub async fn leave_group(db: &DatabaseConnection, group_id: i64, user_id: i64) -> Result<()> {
    let found_group = Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;

    let found = get_membership(db, group_id, user_id)
        .await?
        .ok_or(Error::NotMember { user_id, group_id })?;

    let leaving = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    found.delete(db).await?;

    notify_user(
        db,
        user_id,
        "group_leave",
        &format!("You left the group '{}'", found_group.name),
        Some(group_id),
    )
    .await?;
    notify_admins(
        db,
        "group_leave",
        &format!("{} left the group '{}'", leaving.name, found_group.name),
        Some(group_id),
    )
    .await?;

    Ok(())
}

/// Suspends a group: no new joins or contributions. Existing transactions and
/// the computed balance are unaffected.
pub async fn archive_group(db: &DatabaseConnection, group_id: i64) -> Result<group::Model> {
    set_archived(db, group_id, true).await
}

/// Reactivates an archived group.
pub async fn unarchive_group(db: &DatabaseConnection, group_id: i64) -> Result<group::Model> {
    set_archived(db, group_id, false).await
}

async fn set_archived(
    db: &DatabaseConnection,
    group_id: i64,
    archived: bool,
) -> Result<group::Model> {
    let found = Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;

    let mut active: group::ActiveModel = found.into();
    active.archived = Set(archived);
    active.update(db).await.map_err(Into::into)
}

/// Hard-deletes a group and everything it owns: memberships, transactions,
/// and group-scoped notifications. One store transaction, irreversible.
pub async fn delete_group(db: &DatabaseConnection, group_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    Group::find_by_id(group_id)
        .one(&txn)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;

    delete_group_rows(&txn, group_id).await?;

    txn.commit().await?;
    Ok(())
}

/// Deletes a group's dependent rows and the group row itself. The caller owns
/// the transaction boundary; dependents go first so the store's foreign keys
/// stay satisfied throughout.
pub(crate) async fn delete_group_rows<C>(db: &C, group_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Notification::delete_many()
        .filter(notification::Column::GroupId.eq(group_id))
        .exec(db)
        .await?;
    Transaction::delete_many()
        .filter(transaction::Column::GroupId.eq(group_id))
        .exec(db)
        .await?;
    Membership::delete_many()
        .filter(membership::Column::GroupId.eq(group_id))
        .exec(db)
        .await?;
    Group::delete_by_id(group_id).exec(db).await?;

    Ok(())
}

/// Flips the member's auto-pay opt-in consumed by the recurring sweep.
pub async fn set_auto_pay(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
    enabled: bool,
) -> Result<membership::Model> {
    let found = get_membership(db, group_id, user_id)
        .await?
        .ok_or(Error::NotMember { user_id, group_id })?;

    let mut active: membership::ActiveModel = found.into();
    active.auto_pay = Set(enabled);
    active.update(db).await.map_err(Into::into)
}

/// Finds the membership row for a (user, group) pair, if any.
pub async fn get_membership<C>(
    db: &C,
    group_id: i64,
    user_id: i64,
) -> Result<Option<membership::Model>>
where
    C: ConnectionTrait,
{
    Membership::find()
        .filter(membership::Column::GroupId.eq(group_id))
        .filter(membership::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a group by id.
pub async fn get_group_by_id(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<Option<group::Model>> {
    Group::find_by_id(group_id).one(db).await.map_err(Into::into)
}

/// Finds a group by name.
pub async fn get_group_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<group::Model>> {
    Group::find()
        .filter(group::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists non-archived groups, ordered alphabetically by name.
pub async fn list_active_groups(db: &DatabaseConnection) -> Result<Vec<group::Model>> {
    Group::find()
        .filter(group::Column::Archived.eq(false))
        .order_by_asc(group::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the users belonging to a group.
pub async fn list_group_members(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<Vec<user::Model>> {
    let rows = Membership::find()
        .filter(membership::Column::GroupId.eq(group_id))
        .find_also_related(User)
        .all(db)
        .await?;

    Ok(rows.into_iter().filter_map(|(_, u)| u).collect())
}
