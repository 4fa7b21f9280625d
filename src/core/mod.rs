//! Core business logic - framework-agnostic ledger, state machine, registry,
//! scheduler, and notification operations.
//!
//! Everything here is reachable with plain identifiers and amounts; no web or
//! CLI types leak in. All coordination between concurrent callers goes through
//! the persistent store's transactional guarantees.

/// Membership and group registry operations
pub mod group;
/// Ledger engine - derives a group's spendable balance from its history
pub mod ledger;
/// Notification side-channel - append-only event fan-out
pub mod notification;
/// Recurring contribution sweep - generates monthly obligations
pub mod scheduler;
/// Transaction state machine - creation paths and status transitions
pub mod transaction;
/// User registration, bootstrap seeding, and admin user actions
pub mod user;
