use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use calhive_core::calendar::{AccessLevel, Calendar, Member, UpdateCalendarRequest, User};
use calhive_core::storage::{
    calendar_to_item, item_to_calendar, item_to_member, keys, member_item_calendar_id,
    member_to_item, RepositoryError, Result, Table, WriteCondition,
};
use calhive_core::OperationContext;

/// Persists calendar aggregates and their membership rows.
///
/// A calendar is one `CALENDAR` row plus one `MEMBER#<user_id>` row per
/// member, all in the calendar's partition. Membership rows are indexed under
/// the member's user key so a user's calendars can be listed.
#[derive(Clone)]
pub struct CalendarStore {
    table: Arc<dyn Table>,
}

fn calendar_not_found(calendar_id: Uuid) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: "Calendar",
        id: calendar_id.to_string(),
    }
}

impl CalendarStore {
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self { table }
    }

    /// Writes the aggregate row, then one membership row per member.
    ///
    /// The writes are not atomic. If a membership write fails the rows
    /// already written are removed again and the original error is returned,
    /// so no calendar is left without its owner.
    pub async fn create(&self, ctx: &OperationContext, calendar: &Calendar) -> Result<()> {
        ctx.run(
            self.table
                .put_item(calendar_to_item(calendar), WriteCondition::None),
        )
        .await?;

        let mut written = Vec::with_capacity(calendar.members.len());
        for member in &calendar.members {
            let item = member_to_item(calendar.id, member);
            let sk = item.sk.clone();
            if let Err(err) = ctx.run(self.table.put_item(item, WriteCondition::None)).await {
                tracing::error!(
                    calendar_id = %calendar.id,
                    pk = %keys::calendar_pk(calendar.id),
                    sk = %sk,
                    error = %err,
                    "Membership row failed, rolling back calendar"
                );
                self.roll_back_create(calendar.id, &written).await;
                return Err(err);
            }
            written.push(sk);
        }

        tracing::info!(calendar_id = %calendar.id, owner = %calendar.owner_user_id, "Created calendar");
        Ok(())
    }

    /// Loads the aggregate row and hydrates its members. Events are not
    /// loaded.
    pub async fn find_by_id(&self, ctx: &OperationContext, calendar_id: Uuid) -> Result<Calendar> {
        let pk = keys::calendar_pk(calendar_id);
        let item = ctx
            .run(self.table.get_item(&pk, keys::calendar_sk()))
            .await?
            .ok_or_else(|| calendar_not_found(calendar_id))?;

        let mut calendar = item_to_calendar(&item)?;
        calendar.members = self.load_members(ctx, calendar_id).await?;
        Ok(calendar)
    }

    /// Lists every calendar `user_id` is a member of, through the user index.
    ///
    /// Membership rows whose calendar has disappeared are skipped.
    pub async fn find_by_user_id(
        &self,
        ctx: &OperationContext,
        user_id: &str,
    ) -> Result<Vec<Calendar>> {
        let memberships = ctx
            .run(
                self.table
                    .query_user_index(&keys::user_index_key(user_id), keys::MEMBER_PREFIX),
            )
            .await?;

        let mut calendars = Vec::with_capacity(memberships.len());
        for membership in &memberships {
            let calendar_id = member_item_calendar_id(membership)?;
            match self.find_by_id(ctx, calendar_id).await {
                Ok(calendar) => calendars.push(calendar),
                Err(RepositoryError::NotFound { .. }) => {
                    tracing::warn!(%calendar_id, %user_id, "Skipping orphaned membership row");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(calendars)
    }

    /// Full scan of aggregate rows. Returns an empty list when there are none.
    pub async fn find_all_calendars(&self, ctx: &OperationContext) -> Result<Vec<Calendar>> {
        let items = ctx
            .run(self.table.scan_by_sort_key(keys::calendar_sk()))
            .await?;

        let mut calendars = Vec::with_capacity(items.len());
        for item in &items {
            let mut calendar = item_to_calendar(item)?;
            calendar.members = self.load_members(ctx, calendar.id).await?;
            calendars.push(calendar);
        }
        Ok(calendars)
    }

    /// Merges `input` into `existing` and writes the aggregate row back.
    ///
    /// Identity, owner and members never change here.
    pub async fn edit(
        &self,
        ctx: &OperationContext,
        existing: &Calendar,
        input: UpdateCalendarRequest,
    ) -> Result<Calendar> {
        let mut merged = existing.clone();
        input.apply_to(&mut merged);
        merged.updated_at = Utc::now();

        ctx.run(
            self.table
                .put_item(calendar_to_item(&merged), WriteCondition::MustExist),
        )
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound { .. } => calendar_not_found(existing.id),
            other => other,
        })?;

        tracing::info!(calendar_id = %merged.id, "Updated calendar");
        Ok(merged)
    }

    /// Deletes every row in the calendar's partition.
    ///
    /// Event, index and membership rows go first and the aggregate row last,
    /// so an interrupted delete leaves a calendar that can be deleted again.
    pub async fn delete(&self, ctx: &OperationContext, calendar_id: Uuid) -> Result<()> {
        let pk = keys::calendar_pk(calendar_id);
        let rows = ctx.run(self.table.query_by_prefix(&pk, "")).await?;

        let mut removed = 0usize;
        for row in rows.iter().filter(|row| row.sk != keys::calendar_sk()) {
            ctx.run(self.table.delete_item(&pk, &row.sk, WriteCondition::None))
                .await?;
            removed += 1;
        }

        ctx.run(
            self.table
                .delete_item(&pk, keys::calendar_sk(), WriteCondition::MustExist),
        )
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound { .. } => calendar_not_found(calendar_id),
            other => other,
        })?;

        tracing::info!(%calendar_id, dependent_rows = removed, "Deleted calendar");
        Ok(())
    }

    /// Adds `user` as a follower. A user who is already a member keeps their
    /// current access level.
    pub async fn follow_calendar(
        &self,
        ctx: &OperationContext,
        calendar: &Calendar,
        user: &User,
    ) -> Result<()> {
        if calendar.member(&user.user_id).is_some() {
            tracing::debug!(calendar_id = %calendar.id, user_id = %user.user_id, "Already a member");
            return Ok(());
        }

        let item = member_to_item(calendar.id, &Member::follower(user));
        ctx.run(self.table.put_item(item, WriteCondition::None))
            .await?;

        tracing::info!(calendar_id = %calendar.id, user_id = %user.user_id, "Followed calendar");
        Ok(())
    }

    /// Removes `user`'s follower row. Users who do not follow the calendar
    /// are left untouched.
    pub async fn unfollow_calendar(
        &self,
        ctx: &OperationContext,
        calendar: &Calendar,
        user: &User,
    ) -> Result<()> {
        let follows = calendar
            .member(&user.user_id)
            .is_some_and(|m| m.access_level == AccessLevel::Follower);
        if !follows {
            tracing::debug!(calendar_id = %calendar.id, user_id = %user.user_id, "Not a follower");
            return Ok(());
        }

        ctx.run(self.table.delete_item(
            &keys::calendar_pk(calendar.id),
            &keys::member_sk(&user.user_id),
            WriteCondition::None,
        ))
        .await?;

        tracing::info!(calendar_id = %calendar.id, user_id = %user.user_id, "Unfollowed calendar");
        Ok(())
    }

    // Runs outside the operation context: a cancelled request still cleans up.
    async fn roll_back_create(&self, calendar_id: Uuid, member_sks: &[String]) {
        let pk = keys::calendar_pk(calendar_id);
        let sks = member_sks
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(keys::calendar_sk()));
        for sk in sks {
            if let Err(err) = self.table.delete_item(&pk, sk, WriteCondition::None).await {
                tracing::error!(%calendar_id, %pk, %sk, error = %err, "Rollback of calendar row failed");
            }
        }
    }

    async fn load_members(&self, ctx: &OperationContext, calendar_id: Uuid) -> Result<Vec<Member>> {
        let rows = ctx
            .run(
                self.table
                    .query_by_prefix(&keys::calendar_pk(calendar_id), keys::MEMBER_PREFIX),
            )
            .await?;
        rows.iter().map(item_to_member).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryTable;

    fn store() -> (CalendarStore, InMemoryTable) {
        let table = InMemoryTable::new();
        (CalendarStore::new(Arc::new(table.clone())), table)
    }

    #[tokio::test]
    async fn test_create_and_find_by_id_hydrates_members() {
        let (store, _) = store();
        let ctx = OperationContext::background();
        let calendar = Calendar::new("Team", true, "u1", "Alice");

        store.create(&ctx, &calendar).await.unwrap();
        let loaded = store.find_by_id(&ctx, calendar.id).await.unwrap();

        assert_eq!(loaded.name, "Team");
        assert_eq!(loaded.members, calendar.members);
        assert!(loaded.events.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id_missing_is_not_found() {
        let (store, _) = store();
        let ctx = OperationContext::background();
        let id = Uuid::new_v4();

        let result = store.find_by_id(&ctx, id).await;

        assert_eq!(
            result,
            Err(RepositoryError::NotFound {
                entity_type: "Calendar",
                id: id.to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_find_by_user_id_uses_memberships() {
        let (store, _) = store();
        let ctx = OperationContext::background();
        let mine = Calendar::new("Mine", false, "u1", "Alice");
        let theirs = Calendar::new("Theirs", true, "u2", "Bob");
        store.create(&ctx, &mine).await.unwrap();
        store.create(&ctx, &theirs).await.unwrap();

        let follower = User::new("u1", "Alice", "alice@example.com");
        store.follow_calendar(&ctx, &theirs, &follower).await.unwrap();

        let mut names: Vec<_> = store
            .find_by_user_id(&ctx, "u1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Mine", "Theirs"]);

        assert!(store.find_by_user_id(&ctx, "u3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_all_calendars_empty_table() {
        let (store, _) = store();
        let ctx = OperationContext::background();

        assert!(store.find_all_calendars(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_keeps_identity_and_members() {
        let (store, _) = store();
        let ctx = OperationContext::background();
        let calendar = Calendar::new("A", true, "u1", "Alice");
        store.create(&ctx, &calendar).await.unwrap();

        let edited = store
            .edit(
                &ctx,
                &calendar,
                UpdateCalendarRequest::new().with_name("").with_public(false),
            )
            .await
            .unwrap();

        assert_eq!(edited.name, "A");
        assert!(!edited.is_public);

        let loaded = store.find_by_id(&ctx, calendar.id).await.unwrap();
        assert_eq!(loaded.id, calendar.id);
        assert_eq!(loaded.owner_user_id, "u1");
        assert_eq!(loaded.members, calendar.members);
        assert!(!loaded.is_public);
    }

    #[tokio::test]
    async fn test_delete_cascades_partition() {
        let (store, table) = store();
        let ctx = OperationContext::background();
        let calendar = Calendar::new("Team", true, "u1", "Alice");
        store.create(&ctx, &calendar).await.unwrap();
        store
            .follow_calendar(&ctx, &calendar, &User::new("u2", "Bob", "bob@example.com"))
            .await
            .unwrap();

        store.delete(&ctx, calendar.id).await.unwrap();

        assert_eq!(table.len().await, 0);
        assert!(store.find_by_user_id(&ctx, "u2").await.unwrap().is_empty());
        assert!(matches!(
            store.delete(&ctx, calendar.id).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_interrupted_delete_keeps_aggregate() {
        let (store, table) = store();
        let ctx = OperationContext::background();
        let calendar = Calendar::new("Team", true, "u1", "Alice");
        store.create(&ctx, &calendar).await.unwrap();

        table.fail_writes_with_prefix("CALENDAR").await;
        assert!(store.delete(&ctx, calendar.id).await.is_err());
        assert!(table.contains(&calendar.id.to_string(), "CALENDAR").await);

        table.clear_faults().await;
        store.delete(&ctx, calendar.id).await.unwrap();
        assert_eq!(table.len().await, 0);
    }

    #[tokio::test]
    async fn test_follow_is_idempotent_and_keeps_owner_level() {
        let (store, _) = store();
        let ctx = OperationContext::background();
        let calendar = Calendar::new("Team", true, "u1", "Alice");
        store.create(&ctx, &calendar).await.unwrap();
        let bob = User::new("u2", "Bob", "bob@example.com");

        store.follow_calendar(&ctx, &calendar, &bob).await.unwrap();
        let once = store.find_by_id(&ctx, calendar.id).await.unwrap();
        store.follow_calendar(&ctx, &once, &bob).await.unwrap();
        let twice = store.find_by_id(&ctx, calendar.id).await.unwrap();
        assert_eq!(once.members, twice.members);

        let alice = User::new("u1", "Alice", "alice@example.com");
        store.follow_calendar(&ctx, &twice, &alice).await.unwrap();
        let after = store.find_by_id(&ctx, calendar.id).await.unwrap();
        assert_eq!(
            after.member("u1").map(|m| m.access_level),
            Some(AccessLevel::Owner)
        );
    }

    #[tokio::test]
    async fn test_unfollow_non_follower_succeeds() {
        let (store, _) = store();
        let ctx = OperationContext::background();
        let calendar = Calendar::new("Team", true, "u1", "Alice");
        store.create(&ctx, &calendar).await.unwrap();
        let bob = User::new("u2", "Bob", "bob@example.com");

        store.unfollow_calendar(&ctx, &calendar, &bob).await.unwrap();

        store.follow_calendar(&ctx, &calendar, &bob).await.unwrap();
        let followed = store.find_by_id(&ctx, calendar.id).await.unwrap();
        store.unfollow_calendar(&ctx, &followed, &bob).await.unwrap();

        let after = store.find_by_id(&ctx, calendar.id).await.unwrap();
        assert!(after.member("u2").is_none());
    }

    #[tokio::test]
    async fn test_failed_membership_write_rolls_back_calendar() {
        let (store, table) = store();
        let ctx = OperationContext::background();
        let calendar = Calendar::new("Team", true, "u1", "Alice");
        table.fail_writes_with_prefix(keys::MEMBER_PREFIX).await;

        let result = store.create(&ctx, &calendar).await;

        assert!(matches!(result, Err(RepositoryError::ConnectionFailed(_))));
        assert!(!table.contains(&calendar.id.to_string(), "CALENDAR").await);
        assert_eq!(table.len().await, 0);
        assert!(store.find_all_calendars(&ctx).await.unwrap().is_empty());
        assert!(matches!(
            store.find_by_id(&ctx, calendar.id).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
