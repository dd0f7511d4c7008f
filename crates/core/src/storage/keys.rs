//! Key generation for the single-table layout.
//!
//! Calendar-scoped rows share a partition named by the calendar ID and are told
//! apart by their sort key. User profiles live in their own partitions.

use uuid::Uuid;

// ============================================================================
// Sort key discriminators
// ============================================================================

pub const CALENDAR_SK: &str = "CALENDAR";
pub const EVENT_PREFIX: &str = "EVENT#";
pub const EVENT_INDEX_PREFIX: &str = "CAL#";
pub const MEMBER_PREFIX: &str = "MEMBER#";
pub const USER_PREFIX: &str = "USER#";
pub const PROFILE_SK: &str = "PROFILE";

// ============================================================================
// Calendar partition
// ============================================================================

/// Partition key for every calendar-scoped row.
///
/// Pattern: `<calendar_id>`
pub fn calendar_pk(calendar_id: Uuid) -> String {
    calendar_id.to_string()
}

/// Sort key of the calendar aggregate row.
pub fn calendar_sk() -> &'static str {
    CALENDAR_SK
}

/// Sort key of an event row.
///
/// Pattern: `EVENT#<event_id>`
pub fn event_sk(event_id: Uuid) -> String {
    format!("{EVENT_PREFIX}{event_id}")
}

/// Sort key of an event-index row.
///
/// Pattern: `CAL#<calendar_id>#<event_id>`
pub fn event_index_sk(calendar_id: Uuid, event_id: Uuid) -> String {
    format!("{EVENT_INDEX_PREFIX}{calendar_id}#{event_id}")
}

/// Sort key of a membership row.
///
/// Pattern: `MEMBER#<user_id>`
pub fn member_sk(user_id: &str) -> String {
    format!("{MEMBER_PREFIX}{user_id}")
}

// ============================================================================
// User partition and user index
// ============================================================================

/// Partition key of a user profile.
///
/// Pattern: `USER#<user_id>`
pub fn user_pk(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Sort key of a user profile.
pub fn user_sk() -> &'static str {
    PROFILE_SK
}

/// User-index partition key for rows that belong to a user.
///
/// Pattern: `USER#<user_id>`
pub fn user_index_key(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

// ============================================================================
// Parsing
// ============================================================================

/// Extracts the event ID from an `EVENT#<event_id>` sort key.
pub fn parse_event_sk(sk: &str) -> Option<Uuid> {
    sk.strip_prefix(EVENT_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// Extracts `(calendar_id, event_id)` from a `CAL#<calendar_id>#<event_id>`
/// sort key.
pub fn parse_event_index_sk(sk: &str) -> Option<(Uuid, Uuid)> {
    let rest = sk.strip_prefix(EVENT_INDEX_PREFIX)?;
    let (calendar_id, event_id) = rest.split_once('#')?;
    Some((
        Uuid::parse_str(calendar_id).ok()?,
        Uuid::parse_str(event_id).ok()?,
    ))
}
