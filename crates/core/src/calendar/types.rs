use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access level a user holds on a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    /// Created the calendar. Exactly one per calendar.
    Owner,
    /// Invited collaborator with write access.
    Member,
    /// Read-only subscriber of a public calendar.
    Follower,
}

impl AccessLevel {
    /// Returns true if this level may create, edit or delete events.
    pub fn can_write(&self) -> bool {
        matches!(self, AccessLevel::Owner | AccessLevel::Member)
    }

    /// Returns the persisted representation of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Owner => "OWNER",
            AccessLevel::Member => "MEMBER",
            AccessLevel::Follower => "FOLLOWER",
        }
    }
}

/// An authenticated person known to the system.
///
/// Users are created lazily the first time a verified subject is seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable external identity (the token subject).
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user record for the given subject.
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}

/// A user's membership in a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: String,
    pub display_name: String,
    pub access_level: AccessLevel,
}

impl Member {
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        access_level: AccessLevel,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            access_level,
        }
    }

    /// Membership of `user` as a follower.
    pub fn follower(user: &User) -> Self {
        Self::new(&user.user_id, &user.display_name, AccessLevel::Follower)
    }
}

/// A calendar aggregate.
///
/// `members` is hydrated from membership rows on every load. `events` is only
/// populated in memory by callers that append to a loaded calendar; stores
/// never fill it on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: Uuid,
    pub name: String,
    pub is_public: bool,
    pub owner_user_id: String,
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Calendar {
    /// Creates a new calendar owned by the given user.
    ///
    /// The owner becomes the only member, with access level `OWNER`.
    pub fn new(
        name: impl Into<String>,
        is_public: bool,
        owner_user_id: impl Into<String>,
        owner_name: impl Into<String>,
    ) -> Self {
        let owner_user_id = owner_user_id.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_public,
            members: vec![Member::new(
                owner_user_id.clone(),
                owner_name,
                AccessLevel::Owner,
            )],
            owner_user_id,
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets a specific ID for this calendar (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Returns the membership of `user_id`, if any.
    pub fn member(&self, user_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_user_id == user_id
    }

    /// Returns true if `user_id` may read this calendar.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_public || self.member(user_id).is_some()
    }

    /// Returns true if `user_id` may create, edit or delete events.
    pub fn can_write(&self, user_id: &str) -> bool {
        self.member(user_id)
            .is_some_and(|m| m.access_level.can_write())
    }

    /// Iterates over the members following this calendar.
    pub fn followers(&self) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(|m| m.access_level == AccessLevel::Follower)
    }
}

/// An event inside a calendar.
///
/// The content fields are a flat set; `calendar_id` is always assigned by the
/// server, never taken from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new untimed event in the given calendar.
    pub fn new(calendar_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            calendar_id,
            title: title.into(),
            description: None,
            location: None,
            starts_at: None,
            ends_at: None,
            all_day: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_time_range(mut self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self.ends_at = Some(ends_at);
        self
    }

    /// Sets a specific ID for this event (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_calendar_has_single_owner() {
        let calendar = Calendar::new("Team", true, "u1", "Alice");

        assert_eq!(calendar.members.len(), 1);
        let owner = &calendar.members[0];
        assert_eq!(owner.user_id, "u1");
        assert_eq!(owner.access_level, AccessLevel::Owner);
        assert_eq!(calendar.owner_user_id, "u1");
        assert!(calendar.events.is_empty());
    }

    #[test]
    fn test_visibility_rules() {
        let mut calendar = Calendar::new("Private", false, "u1", "Alice");
        assert!(calendar.is_visible_to("u1"));
        assert!(!calendar.is_visible_to("u2"));

        calendar.is_public = true;
        assert!(calendar.is_visible_to("u2"));
    }

    #[test]
    fn test_write_access_by_level() {
        let mut calendar = Calendar::new("Team", true, "u1", "Alice");
        calendar
            .members
            .push(Member::new("u2", "Bob", AccessLevel::Member));
        calendar
            .members
            .push(Member::new("u3", "Carol", AccessLevel::Follower));

        assert!(calendar.can_write("u1"));
        assert!(calendar.can_write("u2"));
        assert!(!calendar.can_write("u3"));
        assert!(!calendar.can_write("stranger"));
        assert_eq!(calendar.followers().count(), 1);
    }

    #[test]
    fn test_access_level_serializes_uppercase() {
        let json = serde_json::to_string(&AccessLevel::Follower).unwrap();
        assert_eq!(json, "\"FOLLOWER\"");
        assert_eq!(AccessLevel::Owner.as_str(), "OWNER");
    }

    #[test]
    fn test_calendar_json_uses_camel_case_and_hides_empty_events() {
        let calendar = Calendar::new("Team", true, "u1", "Alice");
        let json = serde_json::to_value(&calendar).unwrap();

        assert_eq!(json["isPublic"], true);
        assert_eq!(json["ownerUserId"], "u1");
        assert!(json.get("events").is_none());
    }
}
