//! Conversions between domain types and table rows.
//!
//! Pure functions, testable without any table behind them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::calendar::{AccessLevel, Calendar, Event, Member, User};

use super::item::{AttributeValue, Item};
use super::{keys, RepositoryError, Result};

// ============================================================================
// Entity type constants
// ============================================================================

pub const ENTITY_TYPE_CALENDAR: &str = "CALENDAR";
pub const ENTITY_TYPE_MEMBER: &str = "MEMBER";
pub const ENTITY_TYPE_EVENT: &str = "EVENT";
pub const ENTITY_TYPE_EVENT_INDEX: &str = "EVENT_INDEX";
pub const ENTITY_TYPE_USER: &str = "USER";

/// A decoded event-index row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIndexEntry {
    pub calendar_id: Uuid,
    pub event_id: Uuid,
    /// User the row is indexed under (the calendar owner at write time).
    pub user_id: String,
}

// ============================================================================
// Calendar conversions
// ============================================================================

/// Convert a Calendar to its aggregate row. Members and events are separate
/// rows and are not written here.
pub fn calendar_to_item(calendar: &Calendar) -> Item {
    Item::new(keys::calendar_pk(calendar.id), keys::calendar_sk())
        .with_s("entityType", ENTITY_TYPE_CALENDAR)
        .with_s("id", calendar.id.to_string())
        .with_s("name", &calendar.name)
        .with_bool("isPublic", calendar.is_public)
        .with_s("ownerUserId", &calendar.owner_user_id)
        .with_s("createdAt", calendar.created_at.to_rfc3339())
        .with_s("updatedAt", calendar.updated_at.to_rfc3339())
}

/// Convert an aggregate row to a Calendar with no members or events loaded.
pub fn item_to_calendar(item: &Item) -> Result<Calendar> {
    Ok(Calendar {
        id: get_uuid(item, "id")?,
        name: get_string(item, "name")?,
        is_public: get_bool(item, "isPublic")?,
        owner_user_id: get_string(item, "ownerUserId")?,
        members: Vec::new(),
        events: Vec::new(),
        created_at: get_datetime(item, "createdAt")?,
        updated_at: get_datetime(item, "updatedAt")?,
    })
}

// ============================================================================
// Membership conversions
// ============================================================================

/// Convert a membership to its row in the calendar partition, indexed under
/// the member's user key.
pub fn member_to_item(calendar_id: Uuid, member: &Member) -> Item {
    Item::new(
        keys::calendar_pk(calendar_id),
        keys::member_sk(&member.user_id),
    )
    .with_user_key(keys::user_index_key(&member.user_id))
    .with_s("entityType", ENTITY_TYPE_MEMBER)
    .with_s("calendarId", calendar_id.to_string())
    .with_s("userId", &member.user_id)
    .with_s("displayName", &member.display_name)
    .with_s("accessLevel", member.access_level.as_str())
}

pub fn item_to_member(item: &Item) -> Result<Member> {
    Ok(Member {
        user_id: get_string(item, "userId")?,
        display_name: get_string(item, "displayName")?,
        access_level: parse_access_level(&get_string(item, "accessLevel")?)?,
    })
}

/// Calendar ID a membership row belongs to.
pub fn member_item_calendar_id(item: &Item) -> Result<Uuid> {
    get_uuid(item, "calendarId")
}

// ============================================================================
// Event conversions
// ============================================================================

pub fn event_to_item(event: &Event) -> Item {
    Item::new(keys::calendar_pk(event.calendar_id), keys::event_sk(event.id))
        .with_s("entityType", ENTITY_TYPE_EVENT)
        .with_s("id", event.id.to_string())
        .with_s("calendarId", event.calendar_id.to_string())
        .with_s("title", &event.title)
        .with_optional_s("description", event.description.as_deref())
        .with_optional_s("location", event.location.as_deref())
        .with_optional_s("startsAt", event.starts_at.map(|t| t.to_rfc3339()).as_deref())
        .with_optional_s("endsAt", event.ends_at.map(|t| t.to_rfc3339()).as_deref())
        .with_bool("allDay", event.all_day)
        .with_s("createdAt", event.created_at.to_rfc3339())
        .with_s("updatedAt", event.updated_at.to_rfc3339())
}

pub fn item_to_event(item: &Item) -> Result<Event> {
    Ok(Event {
        id: get_uuid(item, "id")?,
        calendar_id: get_uuid(item, "calendarId")?,
        title: get_string(item, "title")?,
        description: get_optional_string(item, "description"),
        location: get_optional_string(item, "location"),
        starts_at: get_optional_datetime(item, "startsAt")?,
        ends_at: get_optional_datetime(item, "endsAt")?,
        all_day: get_optional_bool(item, "allDay").unwrap_or(false),
        created_at: get_datetime(item, "createdAt")?,
        updated_at: get_datetime(item, "updatedAt")?,
    })
}

/// Convert an event to its index row, carrying the user it is indexed under.
pub fn event_index_to_item(event: &Event, user_id: &str) -> Item {
    Item::new(
        keys::calendar_pk(event.calendar_id),
        keys::event_index_sk(event.calendar_id, event.id),
    )
    .with_user_key(keys::user_index_key(user_id))
    .with_s("entityType", ENTITY_TYPE_EVENT_INDEX)
    .with_s("calendarId", event.calendar_id.to_string())
    .with_s("eventId", event.id.to_string())
    .with_s("userId", user_id)
}

pub fn item_to_event_index(item: &Item) -> Result<EventIndexEntry> {
    Ok(EventIndexEntry {
        calendar_id: get_uuid(item, "calendarId")?,
        event_id: get_uuid(item, "eventId")?,
        user_id: get_string(item, "userId")?,
    })
}

// ============================================================================
// User conversions
// ============================================================================

pub fn user_to_item(user: &User) -> Item {
    Item::new(keys::user_pk(&user.user_id), keys::user_sk())
        .with_s("entityType", ENTITY_TYPE_USER)
        .with_s("userId", &user.user_id)
        .with_s("displayName", &user.display_name)
        .with_s("email", &user.email)
        .with_s("createdAt", user.created_at.to_rfc3339())
}

pub fn item_to_user(item: &Item) -> Result<User> {
    Ok(User {
        user_id: get_string(item, "userId")?,
        display_name: get_string(item, "displayName")?,
        email: get_optional_string(item, "email").unwrap_or_default(),
        created_at: get_datetime(item, "createdAt")?,
    })
}

// ============================================================================
// Access level conversions
// ============================================================================

/// Parse AccessLevel from its persisted form.
pub fn parse_access_level(s: &str) -> Result<AccessLevel> {
    match s.to_uppercase().as_str() {
        "OWNER" => Ok(AccessLevel::Owner),
        "MEMBER" => Ok(AccessLevel::Member),
        "FOLLOWER" => Ok(AccessLevel::Follower),
        _ => Err(RepositoryError::InvalidData(format!(
            "Unknown access level: {}",
            s
        ))),
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute.
fn get_string(item: &Item, key: &str) -> Result<String> {
    item.get(key)
        .and_then(AttributeValue::as_s)
        .map(|s| s.to_string())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get an optional string attribute.
fn get_optional_string(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(AttributeValue::as_s)
        .map(|s| s.to_string())
}

fn get_bool(item: &Item, key: &str) -> Result<bool> {
    get_optional_bool(item, key)
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", key)))
}

fn get_optional_bool(item: &Item, key: &str) -> Option<bool> {
    item.get(key).and_then(AttributeValue::as_bool)
}

/// Get a required UUID attribute.
fn get_uuid(item: &Item, key: &str) -> Result<Uuid> {
    let s = get_string(item, key)?;
    Uuid::parse_str(&s)
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid UUID {}: {}", key, e)))
}

/// Get a required datetime attribute (RFC 3339 format).
fn get_datetime(item: &Item, key: &str) -> Result<DateTime<Utc>> {
    let s = get_string(item, key)?;
    parse_datetime(key, &s)
}

fn get_optional_datetime(item: &Item, key: &str) -> Result<Option<DateTime<Utc>>> {
    get_optional_string(item, key)
        .map(|s| parse_datetime(key, &s))
        .transpose()
}

fn parse_datetime(key: &str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid datetime {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    fn sample_calendar() -> Calendar {
        let mut calendar = Calendar::new("Team", true, "u1", "Alice")
            .with_id(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap());
        calendar.created_at = fixed_time();
        calendar.updated_at = fixed_time();
        calendar
    }

    #[test]
    fn test_calendar_item_has_aggregate_keys_and_no_members() {
        let calendar = sample_calendar();
        let item = calendar_to_item(&calendar);

        assert_eq!(item.pk, "550e8400-e29b-41d4-a716-446655440002");
        assert_eq!(item.sk, "CALENDAR");
        assert!(item.user_key.is_none());
        assert_eq!(item.get("isPublic"), Some(&AttributeValue::Bool(true)));

        let decoded = item_to_calendar(&item).unwrap();
        assert_eq!(decoded.name, "Team");
        assert_eq!(decoded.owner_user_id, "u1");
        assert_eq!(decoded.created_at, fixed_time());
        assert!(decoded.members.is_empty());
        assert!(decoded.events.is_empty());
    }

    #[test]
    fn test_member_item_is_indexed_under_user() {
        let calendar = sample_calendar();
        let member = Member::new("u2", "Bob", AccessLevel::Follower);
        let item = member_to_item(calendar.id, &member);

        assert_eq!(item.pk, calendar.id.to_string());
        assert_eq!(item.sk, "MEMBER#u2");
        assert_eq!(item.user_key.as_deref(), Some("USER#u2"));
        assert_eq!(item_to_member(&item).unwrap(), member);
        assert_eq!(member_item_calendar_id(&item).unwrap(), calendar.id);
    }

    #[test]
    fn test_event_item_omits_absent_fields() {
        let calendar = sample_calendar();
        let event = Event::new(calendar.id, "Standup").with_location("Room 1");
        let item = event_to_item(&event);

        assert!(item.sk.starts_with("EVENT#"));
        assert!(item.get("description").is_none());
        assert!(item.get("startsAt").is_none());

        let decoded = item_to_event(&item).unwrap();
        assert_eq!(decoded.title, "Standup");
        assert_eq!(decoded.location.as_deref(), Some("Room 1"));
        assert_eq!(decoded.starts_at, None);
    }

    #[test]
    fn test_event_index_item_carries_owner() {
        let calendar = sample_calendar();
        let event = Event::new(calendar.id, "Standup");
        let item = event_index_to_item(&event, &calendar.owner_user_id);

        assert_eq!(item.pk, calendar.id.to_string());
        assert_eq!(item.sk, format!("CAL#{}#{}", calendar.id, event.id));
        assert_eq!(item.user_key.as_deref(), Some("USER#u1"));

        let entry = item_to_event_index(&item).unwrap();
        assert_eq!(entry.event_id, event.id);
        assert_eq!(entry.user_id, "u1");
    }

    #[test]
    fn test_user_item_keys() {
        let user = User::new("u1", "Alice", "alice@example.com");
        let item = user_to_item(&user);

        assert_eq!(item.pk, "USER#u1");
        assert_eq!(item.sk, "PROFILE");
        assert_eq!(item_to_user(&item).unwrap().email, "alice@example.com");
    }

    #[test]
    fn test_parse_access_level() {
        assert_eq!(parse_access_level("OWNER").unwrap(), AccessLevel::Owner);
        assert_eq!(parse_access_level("follower").unwrap(), AccessLevel::Follower);
        assert!(matches!(
            parse_access_level("ADMIN"),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_missing_field_is_invalid_data() {
        let item = Item::new("pk", "CALENDAR").with_s("id", "not-a-uuid");
        assert!(matches!(
            item_to_calendar(&item),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
