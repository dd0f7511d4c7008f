//! Calendar and event services.
//!
//! Services take the caller's identity as an explicit argument, enforce the
//! visibility and ownership rules, and delegate persistence to the stores.

mod calendar;
mod event;

pub use calendar::CalendarService;
pub use event::EventService;
