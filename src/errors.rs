//! Unified error types for the ledger core.
//!
//! Domain errors (membership conflicts, funds checks, state-machine guards) are
//! recoverable and reported to the caller synchronously; they map to
//! human-readable messages at the outer surface. Infrastructure errors (store
//! failures, bad configuration) are surfaced separately so callers can show a
//! generic retry-later message without leaking internal detail. Use
//! [`Error::is_domain`] to tell the two classes apart.

use crate::entities::transaction::TransactionStatus;
use thiserror::Error;

/// All errors produced by the ledger core.
#[derive(Debug, Error)]
pub enum Error {
    /// No user exists with the given id
    #[error("user not found: {id}")]
    UserNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// No group exists with the given id
    #[error("group not found: {id}")]
    GroupNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// No transaction exists with the given id
    #[error("transaction not found: {id}")]
    TransactionNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// No notification exists with the given id
    #[error("notification not found: {id}")]
    NotificationNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// No pending transaction matches the provider-side reference
    #[error("no pending {provider} payment with reference '{external_id}'")]
    PendingPaymentNotFound {
        /// Payment provider tag recorded at checkout
        provider: String,
        /// Provider-side reference id
        external_id: String,
    },

    /// A membership already exists for the (user, group) pair
    #[error("user {user_id} is already a member of group {group_id}")]
    AlreadyMember {
        /// User attempting to join
        user_id: i64,
        /// Group being joined
        group_id: i64,
    },

    /// No membership exists for the (user, group) pair
    #[error("user {user_id} is not a member of group {group_id}")]
    NotMember {
        /// User the operation was attempted for
        user_id: i64,
        /// Group the operation was attempted against
        group_id: i64,
    },

    /// The group is archived and accepts no new joins or contributions
    #[error("group {group_id} is archived")]
    GroupArchived {
        /// The archived group
        group_id: i64,
    },

    /// An empty or unusable name or email was supplied
    #[error("invalid name: '{name}'")]
    InvalidName {
        /// The offending value
        name: String,
    },

    /// A non-positive contribution or aid amount was supplied
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: i64,
    },

    /// Aid approval would overdraw the group's spendable balance
    #[error("insufficient funds: {requested} requested but only {available} available")]
    InsufficientFunds {
        /// Spendable balance at approval time
        available: i64,
        /// Amount of the aid request
        requested: i64,
    },

    /// The transaction is no longer pending; approved/rejected are terminal
    #[error("transaction is already {status:?}; only pending transactions can transition")]
    InvalidStateTransition {
        /// Current (terminal) status of the transaction
        status: TransactionStatus,
    },

    /// A user or group with this name (or email) already exists
    #[error("name already in use: {name}")]
    DuplicateName {
        /// The colliding name
        name: String,
    },

    /// Configuration error (bad settings value, unreadable seed file)
    #[error("configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Persistent-store failure
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (seed file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Whether this is a recoverable domain error (as opposed to an
    /// infrastructure failure). Domain errors carry a message suitable for
    /// end users; infrastructure errors should be mapped to a generic
    /// retry-later message.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        !matches!(
            self,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::EnvVar(_)
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
