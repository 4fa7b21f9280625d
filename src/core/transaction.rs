//! Transaction state machine - Creation paths and status transitions.
//!
//! A transaction starts `pending` or, for internally paid and admin-forced
//! contributions, directly `approved`. The only mutation a transaction ever
//! sees is the single transition `pending -> approved` or `pending ->
//! rejected`; both terminal states refuse further transitions, so an approved
//! amount can never double-count into the balance. Aid approval re-evaluates
//! the group's balance at approval time inside the same store transaction as
//! the status write, which keeps two concurrent approvals from jointly
//! overdrawing a group.

use crate::{
    core::{
        group::get_membership,
        ledger::Ledger,
        notification::{notify_admins, notify_user},
    },
    entities::{Group, Transaction, User, group, transaction, user},
    errors::{Error, Result},
};
use crate::entities::transaction::{TransactionKind, TransactionStatus};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::warn;

/// Records a member-paid contribution through the internal (no-provider) path.
///
/// No review is needed for money entering the fund, so the transaction is
/// created directly `approved` for the group's monthly amount. Requires an
/// active (non-archived) group and an existing membership.
pub async fn pay_contribution(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
) -> Result<transaction::Model> {
    let (found_group, payer) = contribution_guards(db, group_id, user_id).await?;

    let created = insert_transaction(
        db,
        group_id,
        user_id,
        found_group.monthly_contribution,
        TransactionKind::Contribution,
        TransactionStatus::Approved,
        None,
        None,
        None,
    )
    .await?;

    notify_user(
        db,
        user_id,
        "contribution_paid",
        &format!("Contribution of {} paid", found_group.monthly_contribution),
        Some(group_id),
    )
    .await?;
    notify_admins(
        db,
        "contribution_paid",
        &format!("{} paid their contribution", payer.name),
        Some(group_id),
    )
    .await?;

    Ok(created)
}

/// Records an administrator-entered contribution correction.
///
/// Created and approved atomically in one step, bypassing pending; used for
/// manual corrections outside the normal payment flow, so neither membership
/// nor the archived flag is checked.
pub async fn force_contribution(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
) -> Result<transaction::Model> {
    let found_group = Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let created = insert_transaction(
        db,
        group_id,
        user_id,
        found_group.monthly_contribution,
        TransactionKind::Contribution,
        TransactionStatus::Approved,
        None,
        None,
        None,
    )
    .await?;

    notify_user(
        db,
        user_id,
        "contribution_paid",
        &format!(
            "Contribution of {} recorded",
            found_group.monthly_contribution
        ),
        Some(group_id),
    )
    .await?;
    notify_admins(
        db,
        "contribution_paid",
        &format!("Contribution recorded for user #{user_id}"),
        Some(group_id),
    )
    .await?;

    Ok(created)
}

/// Starts a contribution through an external checkout flow.
///
/// The transaction is created `pending` with the provider tag and external
/// reference recorded; it only becomes `approved` through
/// [`capture_provider_contribution`] once the provider confirms payment.
pub async fn begin_provider_contribution(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
    provider: &str,
    external_id: &str,
) -> Result<transaction::Model> {
    let (found_group, _) = contribution_guards(db, group_id, user_id).await?;

    insert_transaction(
        db,
        group_id,
        user_id,
        found_group.monthly_contribution,
        TransactionKind::Contribution,
        TransactionStatus::Pending,
        None,
        Some(provider.to_string()),
        Some(external_id.to_string()),
    )
    .await
}

/// Approves the pending contribution matching `(provider, external_id)` after
/// a successful provider-side capture.
///
/// If no pending transaction matches, nothing changes and the failure is
/// reported to the caller; capture is never retried automatically here.
pub async fn capture_provider_contribution(
    db: &DatabaseConnection,
    provider: &str,
    external_id: &str,
) -> Result<transaction::Model> {
    // Match and write in one store transaction so a concurrent reject cannot
    // slip between the pending check and the approval.
    let txn = db.begin().await?;

    let found = Transaction::find()
        .filter(transaction::Column::Provider.eq(provider))
        .filter(transaction::Column::ExternalId.eq(external_id))
        .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::PendingPaymentNotFound {
            provider: provider.to_string(),
            external_id: external_id.to_string(),
        })?;

    let mut active: transaction::ActiveModel = found.into();
    active.status = Set(TransactionStatus::Approved);
    let captured = active.update(&txn).await?;

    txn.commit().await?;

    notify_transition(
        db,
        captured.user_id,
        "contribution_paid",
        &format!("Contribution of {} paid ({provider})", captured.amount),
        Some(captured.group_id),
    )
    .await;
    notify_transition_admins(
        db,
        "contribution_paid",
        &format!("{provider} contribution captured for user #{}", captured.user_id),
        Some(captured.group_id),
    )
    .await;

    Ok(captured)
}

/// Files an aid request for administrator review.
///
/// Always created `pending` with the requested amount and optional free-text
/// reason. The funds check happens at approval time, not here.
pub async fn request_aid(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
    amount: i64,
    reason: Option<String>,
) -> Result<transaction::Model> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;
    let requester = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let created = insert_transaction(
        db,
        group_id,
        user_id,
        amount,
        TransactionKind::Aid,
        TransactionStatus::Pending,
        reason.clone(),
        None,
        None,
    )
    .await?;

    let mut message = format!("Aid request from {} for {amount}", requester.name);
    if let Some(reason) = reason {
        message.push_str(&format!(" - Reason: {reason}"));
    }
    notify_admins(db, "aid_request", &message, Some(group_id)).await?;

    Ok(created)
}

/// Approves a pending transaction.
///
/// Contribution approval is unconditional (contributions only add funds). Aid
/// approval is permitted only if the group balance covers the amount,
/// evaluated *at approval time* inside the same store transaction as the
/// status write; a shortfall leaves the row `pending` and returns
/// [`Error::InsufficientFunds`]. Approving a non-pending transaction fails
/// with [`Error::InvalidStateTransition`].
pub async fn approve_transaction(
    db: &DatabaseConnection,
    ledger: &Ledger,
    transaction_id: i64,
) -> Result<transaction::Model> {
    // Funds check and status write are one atomic unit against the store, so
    // two concurrent approvals cannot both pass against a stale balance.
    let txn = db.begin().await?;

    let found = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;

    if found.status != TransactionStatus::Pending {
        return Err(Error::InvalidStateTransition {
            status: found.status,
        });
    }

    if found.kind == TransactionKind::Aid {
        let available = ledger.balance(&txn, found.group_id).await?;
        if available < found.amount {
            // Dropping the txn rolls back; the request stays pending
            return Err(Error::InsufficientFunds {
                available,
                requested: found.amount,
            });
        }
    }

    let mut active: transaction::ActiveModel = found.into();
    active.status = Set(TransactionStatus::Approved);
    let approved = active.update(&txn).await?;

    txn.commit().await?;

    let kind = if approved.kind == TransactionKind::Aid {
        "aid_approved"
    } else {
        "tx_approved"
    };
    notify_transition(
        db,
        approved.user_id,
        kind,
        "Transaction approved",
        Some(approved.group_id),
    )
    .await;
    if approved.kind == TransactionKind::Aid {
        notify_transition_admins(
            db,
            "aid_approved",
            &format!("Aid of {} approved for user #{}", approved.amount, approved.user_id),
            Some(approved.group_id),
        )
        .await;
    }

    Ok(approved)
}

/// Rejects a pending transaction. Terminal and unconditional for either kind;
/// rejecting a non-pending transaction fails with
/// [`Error::InvalidStateTransition`].
pub async fn reject_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<transaction::Model> {
    // Status check and write share one store transaction; a racing capture or
    // approval sees either a pending row or the terminal state, never between.
    let txn = db.begin().await?;

    let found = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;

    if found.status != TransactionStatus::Pending {
        return Err(Error::InvalidStateTransition {
            status: found.status,
        });
    }

    let mut active: transaction::ActiveModel = found.into();
    active.status = Set(TransactionStatus::Rejected);
    let rejected = active.update(&txn).await?;

    txn.commit().await?;

    if rejected.kind == TransactionKind::Aid {
        notify_transition(
            db,
            rejected.user_id,
            "aid_rejected",
            "Your aid request was declined",
            Some(rejected.group_id),
        )
        .await;
    }

    Ok(rejected)
}

/// Post-commit notification write for a status transition. The transition has
/// already persisted, so a failed insert is logged, never returned.
async fn notify_transition(
    db: &DatabaseConnection,
    user_id: i64,
    kind: &str,
    message: &str,
    group_id: Option<i64>,
) {
    if let Err(e) = notify_user(db, user_id, kind, message, group_id).await {
        warn!("notification write failed after committed transition: {e}");
    }
}

/// Post-commit admin fan-out, same best-effort rule as [`notify_transition`].
async fn notify_transition_admins(
    db: &DatabaseConnection,
    kind: &str,
    message: &str,
    group_id: Option<i64>,
) {
    if let Err(e) = notify_admins(db, kind, message, group_id).await {
        warn!("admin notification write failed after committed transition: {e}");
    }
}

/// Retrieves a specific transaction by its unique ID.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all transactions for a group, newest first.
pub async fn get_transactions_for_group(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::GroupId.eq(group_id))
        .order_by_desc(transaction::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the review queue: all pending transactions, oldest first.
pub async fn get_pending_transactions(db: &DatabaseConnection) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
        .order_by_asc(transaction::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Shared guards for member-initiated contribution paths: the group must
/// exist and not be archived, and the payer must be a member.
async fn contribution_guards(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
) -> Result<(group::Model, user::Model)> {
    let found_group = Group::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;
    if found_group.archived {
        return Err(Error::GroupArchived { group_id });
    }

    let payer = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    get_membership(db, group_id, user_id)
        .await?
        .ok_or(Error::NotMember { user_id, group_id })?;

    Ok((found_group, payer))
}

#[allow(clippy::too_many_arguments)]
async fn insert_transaction<C>(
    db: &C,
    group_id: i64,
    user_id: i64,
    amount: i64,
    kind: TransactionKind,
    status: TransactionStatus,
    reason: Option<String>,
    provider: Option<String>,
    external_id: Option<String>,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    transaction::ActiveModel {
        group_id: Set(group_id),
        user_id: Set(user_id),
        amount: Set(amount),
        kind: Set(kind),
        status: Set(status),
        reason: Set(reason),
        created_at: Set(chrono::Utc::now()),
        provider: Set(provider),
        external_id: Set(external_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{
        create_test_group, create_test_user, setup_test_db, setup_with_group, test_ledger,
    };

    #[tokio::test]
    async fn test_pay_contribution_approved_immediately() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;

        let tx = pay_contribution(&db, found_group.id, member.id).await?;
        assert_eq!(tx.kind, TransactionKind::Contribution);
        assert_eq!(tx.status, TransactionStatus::Approved);
        assert_eq!(tx.amount, found_group.monthly_contribution);
        assert!(tx.provider.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_pay_contribution_requires_membership() -> Result<()> {
        let (db, _admin, _member, found_group) = setup_with_group().await?;
        let outsider = create_test_user(&db, "outsider").await?;

        let result = pay_contribution(&db, found_group.id, outsider.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotMember { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_pay_contribution_blocked_on_archived_group() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;

        crate::core::group::archive_group(&db, found_group.id).await?;

        let result = pay_contribution(&db, found_group.id, member.id).await;
        assert!(matches!(result.unwrap_err(), Error::GroupArchived { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_force_contribution_skips_membership_check() -> Result<()> {
        let (db, _admin, _member, found_group) = setup_with_group().await?;
        let outsider = create_test_user(&db, "outsider").await?;

        let tx = force_contribution(&db, found_group.id, outsider.id).await?;
        assert_eq!(tx.status, TransactionStatus::Approved);

        Ok(())
    }

    #[tokio::test]
    async fn test_provider_contribution_pending_until_capture() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;
        let ledger = test_ledger();

        let tx =
            begin_provider_contribution(&db, found_group.id, member.id, "stripe", "cs_123").await?;
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.provider.as_deref(), Some("stripe"));
        assert_eq!(tx.external_id.as_deref(), Some("cs_123"));

        // Pending: balance untouched
        assert_eq!(ledger.balance(&db, found_group.id).await?, 0);

        let captured = capture_provider_contribution(&db, "stripe", "cs_123").await?;
        assert_eq!(captured.id, tx.id);
        assert_eq!(captured.status, TransactionStatus::Approved);
        assert_eq!(
            ledger.balance(&db, found_group.id).await?,
            found_group.monthly_contribution
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_capture_requires_matching_pending_record() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;

        begin_provider_contribution(&db, found_group.id, member.id, "stripe", "cs_123").await?;

        // Wrong provider
        let wrong_provider = capture_provider_contribution(&db, "paypal", "cs_123").await;
        assert!(matches!(
            wrong_provider.unwrap_err(),
            Error::PendingPaymentNotFound { .. }
        ));

        // Wrong reference
        let wrong_ref = capture_provider_contribution(&db, "stripe", "cs_999").await;
        assert!(matches!(
            wrong_ref.unwrap_err(),
            Error::PendingPaymentNotFound { .. }
        ));

        // Successful capture consumes the pending row; a second capture fails
        capture_provider_contribution(&db, "stripe", "cs_123").await?;
        let replay = capture_provider_contribution(&db, "stripe", "cs_123").await;
        assert!(matches!(
            replay.unwrap_err(),
            Error::PendingPaymentNotFound { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_capture_after_reject_changes_nothing() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;
        let ledger = test_ledger();

        let tx =
            begin_provider_contribution(&db, found_group.id, member.id, "stripe", "cs_123").await?;
        reject_transaction(&db, tx.id).await?;

        // A late provider callback must not revive the rejected row
        let late = capture_provider_contribution(&db, "stripe", "cs_123").await;
        assert!(matches!(
            late.unwrap_err(),
            Error::PendingPaymentNotFound { .. }
        ));

        let row = get_transaction_by_id(&db, tx.id).await?.unwrap();
        assert_eq!(row.status, TransactionStatus::Rejected);
        assert_eq!(ledger.balance(&db, found_group.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_request_aid_validation() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;

        let zero = request_aid(&db, found_group.id, member.id, 0, None).await;
        assert!(matches!(zero.unwrap_err(), Error::InvalidAmount { amount: 0 }));

        let negative = request_aid(&db, found_group.id, member.id, -3, None).await;
        assert!(matches!(
            negative.unwrap_err(),
            Error::InvalidAmount { amount: -3 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_request_aid_pending_with_reason() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;

        let tx = request_aid(
            &db,
            found_group.id,
            member.id,
            25,
            Some("medical expenses".to_string()),
        )
        .await?;
        assert_eq!(tx.kind, TransactionKind::Aid);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.reason.as_deref(), Some("medical expenses"));

        Ok(())
    }

    #[tokio::test]
    async fn test_aid_approval_scenario() -> Result<()> {
        // Monthly 10, rate 0.02, three paid contributions,
        // aid 25 approved, aid 10 rejected for insufficient funds.
        let (db, _admin, member, found_group) = setup_with_group().await?;
        let ledger = test_ledger();

        for _ in 0..3 {
            pay_contribution(&db, found_group.id, member.id).await?;
        }
        assert_eq!(ledger.balance(&db, found_group.id).await?, 30);

        let first = request_aid(&db, found_group.id, member.id, 25, None).await?;
        let approved = approve_transaction(&db, &ledger, first.id).await?;
        assert_eq!(approved.status, TransactionStatus::Approved);
        assert_eq!(ledger.balance(&db, found_group.id).await?, 5);

        let second = request_aid(&db, found_group.id, member.id, 10, None).await?;
        let result = approve_transaction(&db, &ledger, second.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientFunds {
                available: 5,
                requested: 10
            }
        ));

        // The request is still pending and the balance unchanged
        let still_pending = get_transaction_by_id(&db, second.id).await?.unwrap();
        assert_eq!(still_pending.status, TransactionStatus::Pending);
        assert_eq!(ledger.balance(&db, found_group.id).await?, 5);

        Ok(())
    }

    #[tokio::test]
    async fn test_funds_check_uses_approval_time_balance() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;
        let ledger = test_ledger();

        // Requested while the fund was empty
        let aid = request_aid(&db, found_group.id, member.id, 10, None).await?;
        let early = approve_transaction(&db, &ledger, aid.id).await;
        assert!(matches!(early.unwrap_err(), Error::InsufficientFunds { .. }));

        // Funds arrive after the request; approval now passes
        pay_contribution(&db, found_group.id, member.id).await?;
        let approved = approve_transaction(&db, &ledger, aid.id).await?;
        assert_eq!(approved.status, TransactionStatus::Approved);

        Ok(())
    }

    #[tokio::test]
    async fn test_terminal_states_refuse_transitions() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;
        let ledger = test_ledger();

        pay_contribution(&db, found_group.id, member.id).await?;
        let aid = request_aid(&db, found_group.id, member.id, 5, None).await?;
        approve_transaction(&db, &ledger, aid.id).await?;

        // Re-approving must not double-count
        let again = approve_transaction(&db, &ledger, aid.id).await;
        assert!(matches!(
            again.unwrap_err(),
            Error::InvalidStateTransition {
                status: TransactionStatus::Approved
            }
        ));
        assert_eq!(ledger.balance(&db, found_group.id).await?, 5);

        // Rejecting an approved transaction fails too
        let reject = reject_transaction(&db, aid.id).await;
        assert!(matches!(reject.unwrap_err(), Error::InvalidStateTransition { .. }));

        // And a rejected one is equally terminal
        let declined = request_aid(&db, found_group.id, member.id, 5, None).await?;
        reject_transaction(&db, declined.id).await?;
        let revive = approve_transaction(&db, &ledger, declined.id).await;
        assert!(matches!(
            revive.unwrap_err(),
            Error::InvalidStateTransition {
                status: TransactionStatus::Rejected
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_approve_pending_contribution_unconditional() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;
        let ledger = test_ledger();

        // A scheduler-style pending obligation approves without a funds check
        let tx =
            begin_provider_contribution(&db, found_group.id, member.id, "stripe", "cs_1").await?;
        let approved = approve_transaction(&db, &ledger, tx.id).await?;
        assert_eq!(approved.status, TransactionStatus::Approved);

        Ok(())
    }

    #[tokio::test]
    async fn test_transitions_survive_notification_sink_loss() -> Result<()> {
        let (db, _admin, member, found_group) = setup_with_group().await?;
        let ledger = test_ledger();

        pay_contribution(&db, found_group.id, member.id).await?;
        let first = request_aid(&db, found_group.id, member.id, 5, None).await?;
        let second = request_aid(&db, found_group.id, member.id, 3, None).await?;

        // The sink going away must not turn a committed transition into an Err
        db.execute_unprepared("DROP TABLE notifications").await?;

        let approved = approve_transaction(&db, &ledger, first.id).await?;
        assert_eq!(approved.status, TransactionStatus::Approved);

        let rejected = reject_transaction(&db, second.id).await?;
        assert_eq!(rejected.status, TransactionStatus::Rejected);

        Ok(())
    }

    #[tokio::test]
    async fn test_approve_unknown_transaction() -> Result<()> {
        let (db, _admin, _member, _group) = setup_with_group().await?;
        let ledger = test_ledger();

        let result = approve_transaction(&db, &ledger, 999).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::TransactionNotFound { id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_group_history_and_review_queue() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = crate::test_utils::create_test_admin(&db).await?;
        let group_a = create_test_group(&db, "alpha", admin.id).await?;
        let group_b = create_test_group(&db, "beta", admin.id).await?;

        pay_contribution(&db, group_a.id, admin.id).await?;
        let aid = request_aid(&db, group_b.id, admin.id, 5, None).await?;

        let history_a = get_transactions_for_group(&db, group_a.id).await?;
        assert_eq!(history_a.len(), 1);
        assert_eq!(history_a[0].group_id, group_a.id);

        let queue = get_pending_transactions(&db).await?;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, aid.id);

        Ok(())
    }
}
