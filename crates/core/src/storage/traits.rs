use async_trait::async_trait;

use crate::calendar::User;
use crate::context::OperationContext;

use super::item::Item;
use super::Result;

/// Precondition attached to a single-item write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteCondition {
    /// Unconditional write.
    #[default]
    None,
    /// The item must already exist. Fails with `NotFound` otherwise.
    MustExist,
    /// The item must not exist yet. Fails with `AlreadyExists` otherwise.
    MustNotExist,
}

/// A single table addressed by partition key and sort key.
///
/// Every operation is atomic for one item only. Stores that need several
/// writes perform them in sequence and own the partial-failure window.
#[async_trait]
pub trait Table: Send + Sync {
    /// Writes a whole item, replacing any previous version.
    async fn put_item(&self, item: Item, condition: WriteCondition) -> Result<()>;

    /// Reads one item.
    async fn get_item(&self, pk: &str, sk: &str) -> Result<Option<Item>>;

    /// Returns every item in `pk` whose sort key starts with `sk_prefix`.
    async fn query_by_prefix(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>>;

    /// Removes one item.
    async fn delete_item(&self, pk: &str, sk: &str, condition: WriteCondition) -> Result<()>;

    /// Full scan for items whose sort key equals `sk`.
    async fn scan_by_sort_key(&self, sk: &str) -> Result<Vec<Item>>;

    /// Queries the user index: items carrying `user_key` whose sort key
    /// starts with `sk_prefix`.
    async fn query_user_index(&self, user_key: &str, sk_prefix: &str) -> Result<Vec<Item>>;
}

/// Directory of known users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Gets a user by ID.
    async fn find_by_user_id(&self, ctx: &OperationContext, user_id: &str)
        -> Result<Option<User>>;

    /// Creates a new user. Fails with `AlreadyExists` if the ID is taken.
    async fn create_user(&self, ctx: &OperationContext, user: &User) -> Result<()>;
}
