//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod group;
pub mod membership;
pub mod notification;
pub mod transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use group::{Column as GroupColumn, Entity as Group, Model as GroupModel};
pub use membership::{Column as MembershipColumn, Entity as Membership, Model as MembershipModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
