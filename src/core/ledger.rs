//! Ledger engine - Derives a group's spendable balance from its transaction
//! history.
//!
//! The balance is a pure function of stored state, recomputed from the full
//! approved-transaction history on every call. There is no running total on the
//! group or membership, so a cached counter can never drift from the
//! authoritative ledger; the cost is an O(transactions-in-group) scan per
//! query, which is the intended trade-off.

use crate::{
    entities::{Transaction, transaction},
    errors::{Error, Result},
};
use sea_orm::prelude::*;

/// Computes group balances with a fixed commission rate.
///
/// The commission rate is supplied once at construction, not looked up from
/// the environment at call time, so every balance read within a process uses
/// the same rate.
#[derive(Debug, Clone, Copy)]
pub struct Ledger {
    commission_rate: f64,
}

impl Ledger {
    /// Creates a ledger engine applying the given commission rate to total
    /// approved contributions.
    #[must_use]
    pub const fn new(commission_rate: f64) -> Self {
        Self { commission_rate }
    }

    /// The commission rate this engine applies.
    #[must_use]
    pub const fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    /// Computes the group's spendable balance:
    ///
    /// ```text
    /// balance = sum(approved contributions)
    ///         - sum(approved aid)
    ///         - trunc(sum(approved contributions) * commission_rate)
    /// ```
    ///
    /// Pending and rejected transactions never contribute. Generic over the
    /// connection so the approval path can evaluate it inside the same store
    /// transaction as the status write.
    pub async fn balance<C>(&self, db: &C, group_id: i64) -> Result<i64>
    where
        C: ConnectionTrait,
    {
        // Verify the group exists so an unknown id is an error, not a zero
        crate::entities::Group::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or(Error::GroupNotFound { id: group_id })?;

        let approved = Transaction::find()
            .filter(transaction::Column::GroupId.eq(group_id))
            .filter(transaction::Column::Status.eq(transaction::TransactionStatus::Approved))
            .all(db)
            .await?;

        let mut contributions: i64 = 0;
        let mut aid: i64 = 0;
        for tx in approved {
            match tx.kind {
                transaction::TransactionKind::Contribution => contributions += tx.amount,
                transaction::TransactionKind::Aid => aid += tx.amount,
            }
        }

        Ok(contributions - aid - self.commission(contributions))
    }

    /// Commission withheld from the given contribution total, truncated
    /// toward zero to a whole currency unit.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    #[must_use]
    pub fn commission(&self, contributions: i64) -> i64 {
        (contributions as f64 * self.commission_rate) as i64
    }
}
