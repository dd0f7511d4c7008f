use thiserror::Error;

/// Errors that can occur when validating calendar input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Calendar name cannot be empty")]
    EmptyName,
    #[error("Calendar name too long (max 100 characters)")]
    NameTooLong,
    #[error("Calendar visibility (isPublic) is required")]
    MissingVisibility,
}

/// Errors that can occur when validating event input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Event title cannot be empty")]
    EmptyTitle,
    #[error("Event title too long (max 200 characters)")]
    TitleTooLong,
    #[error("Event end must be after or equal to its start")]
    InvalidTimeRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_error_display() {
        assert_eq!(
            CalendarError::EmptyName.to_string(),
            "Calendar name cannot be empty"
        );
        assert_eq!(
            CalendarError::MissingVisibility.to_string(),
            "Calendar visibility (isPublic) is required"
        );
    }

    #[test]
    fn test_event_error_display() {
        assert_eq!(
            EventError::EmptyTitle.to_string(),
            "Event title cannot be empty"
        );
        assert_eq!(
            EventError::InvalidTimeRange.to_string(),
            "Event end must be after or equal to its start"
        );
    }
}
