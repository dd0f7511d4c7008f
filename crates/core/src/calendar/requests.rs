//! API request types for calendar and event operations.
//!
//! Pure data types with no I/O. Deserialized from request bodies by the
//! transport layer and handed to the services as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{Calendar, Event};

/// Request payload for creating a new calendar.
///
/// `is_public` stays an `Option` so that an absent flag can be rejected
/// instead of defaulting to `false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCalendarRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// Display name for the owner membership. Looked up from the user
    /// directory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

impl CreateCalendarRequest {
    /// Create a new request with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the visibility flag.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    /// Set the owner display name.
    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }
}

/// Request payload for editing a calendar.
///
/// Merge rule: a non-empty `name` overwrites, an empty one is treated as
/// absent. `is_public` overwrites whenever it is present, `false` included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCalendarRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl UpdateCalendarRequest {
    /// Create an empty update request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the calendar name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the visibility flag.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    /// Apply updates to an existing calendar.
    ///
    /// Identity, owner, members and events are never touched.
    pub fn apply_to(self, calendar: &mut Calendar) {
        if let Some(name) = self.name.filter(|n| !n.is_empty()) {
            calendar.name = name;
        }
        if let Some(is_public) = self.is_public {
            calendar.is_public = is_public;
        }
    }
}

/// Request payload for creating or replacing an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
}

impl EventPayload {
    /// Create a payload with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_time_range(mut self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self.ends_at = Some(ends_at);
        self
    }

    /// Convert into a new event owned by `calendar_id` with a fresh ID.
    pub fn into_event(self, calendar_id: Uuid) -> Event {
        let mut event = Event::new(calendar_id, self.title);
        event.description = self.description;
        event.location = self.location;
        event.starts_at = self.starts_at;
        event.ends_at = self.ends_at;
        event.all_day = self.all_day;
        event
    }

    /// Build the full replacement for `existing`.
    ///
    /// Every content field comes from the payload; the IDs and creation time
    /// are kept from the stored event.
    pub fn replace(self, existing: &Event) -> Event {
        Event {
            id: existing.id,
            calendar_id: existing.calendar_id,
            title: self.title,
            description: self.description,
            location: self.location,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            all_day: self.all_day,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_missing_visibility_is_none() {
        let request: CreateCalendarRequest =
            serde_json::from_str(r#"{"name": "Team"}"#).unwrap();
        assert_eq!(request.name, "Team");
        assert_eq!(request.is_public, None);

        let request: CreateCalendarRequest =
            serde_json::from_str(r#"{"name": "Team", "isPublic": false}"#).unwrap();
        assert_eq!(request.is_public, Some(false));
    }

    #[test]
    fn test_update_empty_name_is_treated_as_absent() {
        let mut calendar = Calendar::new("A", true, "u1", "Alice");

        UpdateCalendarRequest::new()
            .with_name("")
            .with_public(false)
            .apply_to(&mut calendar);

        assert_eq!(calendar.name, "A");
        assert!(!calendar.is_public);
    }

    #[test]
    fn test_update_preserves_identity_and_members() {
        let mut calendar = Calendar::new("A", false, "u1", "Alice");
        let before = calendar.clone();

        UpdateCalendarRequest::new()
            .with_name("B")
            .apply_to(&mut calendar);

        assert_eq!(calendar.name, "B");
        assert_eq!(calendar.id, before.id);
        assert_eq!(calendar.owner_user_id, before.owner_user_id);
        assert_eq!(calendar.members, before.members);
        assert_eq!(calendar.is_public, before.is_public);
    }

    #[test]
    fn test_payload_into_event_assigns_calendar() {
        let calendar_id = Uuid::new_v4();
        let event = EventPayload::new("Standup")
            .with_description("Daily sync")
            .into_event(calendar_id);

        assert_eq!(event.calendar_id, calendar_id);
        assert_eq!(event.title, "Standup");
        assert_eq!(event.description.as_deref(), Some("Daily sync"));
    }

    #[test]
    fn test_payload_replace_keeps_ids_and_clears_omitted_fields() {
        let existing = Event::new(Uuid::new_v4(), "Standup").with_location("Room 1");

        let replaced = EventPayload::new("Retro").replace(&existing);

        assert_eq!(replaced.id, existing.id);
        assert_eq!(replaced.calendar_id, existing.calendar_id);
        assert_eq!(replaced.created_at, existing.created_at);
        assert_eq!(replaced.title, "Retro");
        assert_eq!(replaced.location, None);
    }
}
