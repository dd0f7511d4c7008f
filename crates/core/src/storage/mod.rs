mod conversions;
mod error;
mod http_mapping;
mod item;
pub mod keys;
mod traits;

pub use conversions::{
    calendar_to_item, event_index_to_item, event_to_item, item_to_calendar, item_to_event,
    item_to_event_index, item_to_member, item_to_user, member_item_calendar_id, member_to_item,
    parse_access_level, user_to_item, EventIndexEntry,
};
pub use error::{RepositoryError, Result};
pub use http_mapping::repository_error_to_status_code;
pub use item::{AttributeValue, Item};
pub use traits::{Table, UserDirectory, WriteCondition};
