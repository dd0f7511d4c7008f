//! Calendar, event and user persistence over the single table.
//!
//! Stores speak [`RepositoryError`](calhive_core::storage::RepositoryError)
//! and run every table call inside the caller's
//! [`OperationContext`](calhive_core::OperationContext).

mod calendar;
mod event;
mod user;

pub use calendar::CalendarStore;
pub use event::{EventStore, ReconcileReport};
pub use user::TableUserDirectory;
