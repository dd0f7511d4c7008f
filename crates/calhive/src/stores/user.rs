use std::sync::Arc;

use async_trait::async_trait;

use calhive_core::calendar::User;
use calhive_core::storage::{
    item_to_user, keys, user_to_item, Result, Table, UserDirectory, WriteCondition,
};
use calhive_core::OperationContext;

/// [`UserDirectory`] backed by `USER#<id>`/`PROFILE` rows.
#[derive(Clone)]
pub struct TableUserDirectory {
    table: Arc<dyn Table>,
}

impl TableUserDirectory {
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl UserDirectory for TableUserDirectory {
    async fn find_by_user_id(
        &self,
        ctx: &OperationContext,
        user_id: &str,
    ) -> Result<Option<User>> {
        let item = ctx
            .run(self.table.get_item(&keys::user_pk(user_id), keys::user_sk()))
            .await?;
        item.as_ref().map(item_to_user).transpose()
    }

    async fn create_user(&self, ctx: &OperationContext, user: &User) -> Result<()> {
        ctx.run(
            self.table
                .put_item(user_to_item(user), WriteCondition::MustNotExist),
        )
        .await?;

        tracing::info!(user_id = %user.user_id, "Created user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryTable;
    use calhive_core::storage::RepositoryError;

    #[tokio::test]
    async fn test_create_then_find() {
        let directory = TableUserDirectory::new(Arc::new(InMemoryTable::new()));
        let ctx = OperationContext::background();

        assert_eq!(directory.find_by_user_id(&ctx, "u1").await.unwrap(), None);

        let user = User::new("u1", "Alice", "alice@example.com");
        directory.create_user(&ctx, &user).await.unwrap();

        assert_eq!(
            directory.find_by_user_id(&ctx, "u1").await.unwrap(),
            Some(user)
        );
    }

    #[tokio::test]
    async fn test_create_twice_is_already_exists() {
        let directory = TableUserDirectory::new(Arc::new(InMemoryTable::new()));
        let ctx = OperationContext::background();
        let user = User::new("u1", "Alice", "alice@example.com");

        directory.create_user(&ctx, &user).await.unwrap();
        let result = directory.create_user(&ctx, &user).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
    }
}
