use super::error::{CalendarError, EventError};
use super::requests::CreateCalendarRequest;
use super::types::{Calendar, Event};

/// Maximum calendar name length in characters.
const MAX_NAME_LEN: usize = 100;

/// Maximum event title length in characters.
const MAX_TITLE_LEN: usize = 200;

/// Validates a calendar name.
pub fn validate_calendar_name(name: &str) -> Result<(), CalendarError> {
    if name.trim().is_empty() {
        return Err(CalendarError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CalendarError::NameTooLong);
    }
    Ok(())
}

/// Validates a create request and returns the visibility flag.
///
/// An absent `is_public` is an error, never a default.
pub fn validate_create_calendar(request: &CreateCalendarRequest) -> Result<bool, CalendarError> {
    validate_calendar_name(&request.name)?;
    request.is_public.ok_or(CalendarError::MissingVisibility)
}

/// Validates an event before creation or replacement.
pub fn validate_event(event: &Event) -> Result<(), EventError> {
    if event.title.trim().is_empty() {
        return Err(EventError::EmptyTitle);
    }
    if event.title.chars().count() > MAX_TITLE_LEN {
        return Err(EventError::TitleTooLong);
    }
    if let (Some(start), Some(end)) = (event.starts_at, event.ends_at) {
        if end < start {
            return Err(EventError::InvalidTimeRange);
        }
    }
    Ok(())
}

/// Keeps only the calendars flagged public.
pub fn filter_public_calendars(calendars: Vec<Calendar>) -> Vec<Calendar> {
    calendars.into_iter().filter(|c| c.is_public).collect()
}
