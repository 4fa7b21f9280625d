//! Recurring contribution sweep - Generates monthly obligations.
//!
//! For every non-archived group and every auto-pay membership, the sweep
//! checks when the member last had a contribution of any status recorded and,
//! if 30 days have passed (or none exists), materializes one `pending`
//! contribution for the group's monthly amount. It generates *obligations*,
//! never payments: nothing here auto-approves, so a sweep can never inflate a
//! balance on its own. A member who already has a pending contribution in the
//! group is skipped, which keeps overlapping sweeps from stacking duplicate
//! obligations for the same period.

use crate::{
    core::notification::notify_user,
    entities::{Group, Membership, Transaction, group, membership, transaction},
    errors::Result,
};
use crate::entities::transaction::{TransactionKind, TransactionStatus};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Days between contribution obligations for one member in one group.
pub const CONTRIBUTION_PERIOD_DAYS: i64 = 30;

/// One obligation materialized by a sweep.
#[derive(Debug, Clone)]
pub struct ObligationResult {
    /// Group the obligation belongs to
    pub group_name: String,
    /// Member the obligation is owed by
    pub user_id: i64,
    /// Amount due (the group's monthly contribution)
    pub amount: i64,
}

/// Summary of a single sweep run.
#[derive(Debug, Clone, Default)]
pub struct SweepOutcome {
    /// Obligations created by this run
    pub obligations: Vec<ObligationResult>,
    /// Number of non-archived groups visited
    pub groups_processed: usize,
    /// Number of auto-pay memberships examined
    pub members_checked: usize,
    /// Members skipped because a pending contribution already exists
    pub skipped_pending: usize,
    /// Members skipped because their last contribution is too recent
    pub skipped_not_due: usize,
}

/// Whether a member owes a new contribution in a group at time `now`: true if
/// they have no contribution transaction there at all, or if their most
/// recent one (of any status) is at least [`CONTRIBUTION_PERIOD_DAYS`] old.
pub async fn is_contribution_due(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<bool> {
    let last = Transaction::find()
        .filter(transaction::Column::GroupId.eq(group_id))
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Kind.eq(TransactionKind::Contribution))
        .order_by_desc(transaction::Column::CreatedAt)
        .one(db)
        .await?;

    Ok(last.is_none_or(|tx| (now - tx.created_at).num_days() >= CONTRIBUTION_PERIOD_DAYS))
}

/// Runs one sweep over all active groups and auto-pay memberships, creating
/// pending contribution obligations where due and notifying each member.
///
/// Each obligation is written independently; the sweep tolerates interleaving
/// with manual payment actions because "due" is re-derived from the latest
/// transaction at sweep time and the pending-contribution guard closes the
/// duplicate-obligation window.
pub async fn run_contribution_sweep(db: &DatabaseConnection) -> Result<SweepOutcome> {
    let now = Utc::now();
    let mut outcome = SweepOutcome::default();

    let groups = Group::find()
        .filter(group::Column::Archived.eq(false))
        .all(db)
        .await?;

    for g in groups {
        outcome.groups_processed += 1;

        let members = Membership::find()
            .filter(membership::Column::GroupId.eq(g.id))
            .filter(membership::Column::AutoPay.eq(true))
            .all(db)
            .await?;

        for m in members {
            outcome.members_checked += 1;

            if has_pending_contribution(db, g.id, m.user_id).await? {
                outcome.skipped_pending += 1;
                continue;
            }
            if !is_contribution_due(db, g.id, m.user_id, now).await? {
                outcome.skipped_not_due += 1;
                continue;
            }

            transaction::ActiveModel {
                group_id: Set(g.id),
                user_id: Set(m.user_id),
                amount: Set(g.monthly_contribution),
                kind: Set(TransactionKind::Contribution),
                status: Set(TransactionStatus::Pending),
                reason: Set(None),
                created_at: Set(now),
                provider: Set(None),
                external_id: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await?;

            notify_user(
                db,
                m.user_id,
                "contribution_due",
                &format!(
                    "Contribution of {} due for {}",
                    g.monthly_contribution, g.name
                ),
                Some(g.id),
            )
            .await?;

            outcome.obligations.push(ObligationResult {
                group_name: g.name.clone(),
                user_id: m.user_id,
                amount: g.monthly_contribution,
            });
        }
    }

    Ok(outcome)
}

/// Runs [`run_contribution_sweep`] forever on a fixed period, logging each
/// outcome. A failed sweep is logged and retried on the next tick; the loop
/// itself never exits.
pub async fn run_sweep_loop(db: &DatabaseConnection, period: std::time::Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        match run_contribution_sweep(db).await {
            Ok(outcome) if outcome.obligations.is_empty() => {
                tracing::debug!("Sweep complete, nothing due");
            }
            Ok(outcome) => tracing::info!("{}", format_sweep_summary(&outcome)),
            Err(e) => tracing::error!("Contribution sweep failed: {e}"),
        }
    }
}

/// Whether the member already has a pending contribution in the group, i.e.
/// an obligation (or an uncaptured provider payment) for the current period.
async fn has_pending_contribution(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
) -> Result<bool> {
    let count = Transaction::find()
        .filter(transaction::Column::GroupId.eq(group_id))
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Kind.eq(TransactionKind::Contribution))
        .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
        .count(db)
        .await?;

    Ok(count > 0)
}

/// Formats a sweep outcome into a human-readable summary string for logging.
#[must_use]
pub fn format_sweep_summary(outcome: &SweepOutcome) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Contribution sweep - {} groups, {} members checked, {} obligations created\n",
        outcome.groups_processed,
        outcome.members_checked,
        outcome.obligations.len()
    );

    // write! is infallible when writing to String
    let _ = writeln!(
        summary,
        "  Skipped: {} already pending | {} not yet due",
        outcome.skipped_pending, outcome.skipped_not_due
    );

    for obligation in &outcome.obligations {
        let _ = writeln!(
            summary,
            "  {} - user #{} owes {}",
            obligation.group_name, obligation.user_id, obligation.amount
        );
    }

    summary
}
