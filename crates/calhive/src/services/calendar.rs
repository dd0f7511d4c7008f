use std::sync::Arc;

use uuid::Uuid;

use calhive_core::calendar::{
    filter_public_calendars, validate_calendar_name, validate_create_calendar, Calendar,
    CreateCalendarRequest, UpdateCalendarRequest, User,
};
use calhive_core::storage::UserDirectory;
use calhive_core::{OperationContext, ServiceError};

use crate::stores::CalendarStore;

type Result<T> = std::result::Result<T, ServiceError>;

/// Calendar lifecycle, visibility and follow rules.
#[derive(Clone)]
pub struct CalendarService {
    store: CalendarStore,
    users: Arc<dyn UserDirectory>,
}

impl CalendarService {
    pub fn new(store: CalendarStore, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    /// Loads a calendar the caller may see.
    ///
    /// A private calendar is reported as `NotFound` to anyone who is not a
    /// member, so its existence is not revealed.
    pub async fn find_calendar(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
    ) -> Result<Calendar> {
        let calendar = self.store.find_by_id(ctx, calendar_id).await?;
        if !calendar.is_visible_to(actor) {
            tracing::warn!(%calendar_id, user_id = %actor, "Private calendar hidden from non-member");
            return Err(ServiceError::not_found("Calendar", calendar_id));
        }
        Ok(calendar)
    }

    /// Every calendar the user is a member of, in no particular order.
    pub async fn find_calendars(
        &self,
        ctx: &OperationContext,
        user_id: &str,
    ) -> Result<Vec<Calendar>> {
        Ok(self.store.find_by_user_id(ctx, user_id).await?)
    }

    /// Every public calendar. Scans the whole table.
    pub async fn find_public_calendars(&self, ctx: &OperationContext) -> Result<Vec<Calendar>> {
        let calendars = self.store.find_all_calendars(ctx).await?;
        Ok(filter_public_calendars(calendars))
    }

    /// Creates a calendar owned by `owner_user_id`.
    ///
    /// The owner's display name comes from the request or, when absent, from
    /// the user directory.
    pub async fn create_calendar(
        &self,
        ctx: &OperationContext,
        owner_user_id: &str,
        request: CreateCalendarRequest,
    ) -> Result<Calendar> {
        let is_public = validate_create_calendar(&request)?;

        let owner_name = match request.owner_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => self.require_user(ctx, owner_user_id).await?.display_name,
        };

        let calendar = Calendar::new(request.name.trim(), is_public, owner_user_id, owner_name);
        self.store.create(ctx, &calendar).await?;
        Ok(calendar)
    }

    /// Merges `input` into the calendar. Owner only.
    ///
    /// A non-empty name goes through the same checks as on creation and is
    /// stored trimmed.
    pub async fn edit_calendar(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
        mut input: UpdateCalendarRequest,
    ) -> Result<Calendar> {
        let existing = self.find_owned(ctx, actor, calendar_id, "edit").await?;
        if let Some(name) = input.name.as_mut().filter(|n| !n.is_empty()) {
            validate_calendar_name(name.as_str())?;
            *name = name.trim().to_string();
        }
        Ok(self.store.edit(ctx, &existing, input).await?)
    }

    /// Deletes the calendar with all its events and memberships. Owner only.
    pub async fn delete_calendar(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
    ) -> Result<()> {
        self.find_owned(ctx, actor, calendar_id, "delete").await?;
        Ok(self.store.delete(ctx, calendar_id).await?)
    }

    /// Makes `user_id` a follower of a public calendar.
    ///
    /// Following a private calendar is `PermissionDenied`, never `NotFound`.
    /// Following a calendar one is already a member of changes nothing.
    pub async fn follow_calendar(
        &self,
        ctx: &OperationContext,
        calendar_id: Uuid,
        user_id: &str,
    ) -> Result<()> {
        let calendar = self.store.find_by_id(ctx, calendar_id).await?;
        if !calendar.is_public {
            tracing::warn!(%calendar_id, %user_id, "Follow denied on private calendar");
            return Err(ServiceError::permission_denied(
                "cannot follow a private calendar",
            ));
        }

        let user = self.require_user(ctx, user_id).await?;
        Ok(self.store.follow_calendar(ctx, &calendar, &user).await?)
    }

    /// Removes `user_id` as a follower, whatever the calendar's visibility.
    ///
    /// The owner cannot unfollow their own calendar.
    pub async fn unfollow_calendar(
        &self,
        ctx: &OperationContext,
        calendar_id: Uuid,
        user_id: &str,
    ) -> Result<()> {
        let calendar = self.store.find_by_id(ctx, calendar_id).await?;
        if calendar.is_owner(user_id) {
            tracing::warn!(%calendar_id, %user_id, "Owner tried to unfollow own calendar");
            return Err(ServiceError::permission_denied(
                "the owner cannot unfollow their calendar",
            ));
        }

        let user = self.require_user(ctx, user_id).await?;
        Ok(self.store.unfollow_calendar(ctx, &calendar, &user).await?)
    }

    async fn find_owned(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
        action: &str,
    ) -> Result<Calendar> {
        let calendar = self.find_calendar(ctx, actor, calendar_id).await?;
        if !calendar.is_owner(actor) {
            tracing::warn!(%calendar_id, user_id = %actor, action, "Non-owner calendar mutation denied");
            return Err(ServiceError::permission_denied(format!(
                "only the owner can {action} this calendar"
            )));
        }
        Ok(calendar)
    }

    async fn require_user(&self, ctx: &OperationContext, user_id: &str) -> Result<User> {
        self.users
            .find_by_user_id(ctx, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))
    }
}
