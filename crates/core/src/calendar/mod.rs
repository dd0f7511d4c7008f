mod error;
mod operations;
mod requests;
mod types;

pub use error::{CalendarError, EventError};
pub use operations::{
    filter_public_calendars, validate_calendar_name, validate_create_calendar, validate_event,
};
pub use requests::{CreateCalendarRequest, EventPayload, UpdateCalendarRequest};
pub use types::{AccessLevel, Calendar, Event, Member, User};
