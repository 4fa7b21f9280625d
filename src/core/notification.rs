//! Notification side-channel - Append-only event fan-out to users and admins.
//!
//! Every state-changing operation appends notifications here as a side effect.
//! Delivery is fire-and-forget from the ledger's perspective: rows are written
//! at least once, no acknowledgement is required, and the UI layer consumes
//! them independently. Rows are never mutated except for the read flag.

use crate::{
    entities::{Notification, User, notification, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Appends a notification addressed to one user, optionally scoped to a group.
pub async fn notify_user<C>(
    db: &C,
    user_id: i64,
    kind: &str,
    message: &str,
    group_id: Option<i64>,
) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    let model = notification::ActiveModel {
        user_id: Set(user_id),
        group_id: Set(group_id),
        kind: Set(kind.to_string()),
        message: Set(message.to_string()),
        created_at: Set(chrono::Utc::now()),
        read: Set(false),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Fans a notification out to every administrator.
pub async fn notify_admins<C>(
    db: &C,
    kind: &str,
    message: &str,
    group_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let admins = User::find()
        .filter(user::Column::Role.eq(user::UserRole::Admin))
        .all(db)
        .await?;

    for admin in admins {
        notify_user(db, admin.id, kind, message, group_id).await?;
    }

    Ok(())
}

/// Retrieves all notifications for a user, newest first.
pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .order_by_desc(notification::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts a user's unread notifications.
pub async fn unread_count(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::Read.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Marks a notification as read. The read flag is the only mutation the
/// notification table ever sees.
pub async fn mark_read(
    db: &DatabaseConnection,
    notification_id: i64,
) -> Result<notification::Model> {
    let found = Notification::find_by_id(notification_id)
        .one(db)
        .await?
        .ok_or(Error::NotificationNotFound {
            id: notification_id,
        })?;

    let mut active: notification::ActiveModel = found.into();
    active.read = Set(true);
    active.update(db).await.map_err(Into::into)
}
