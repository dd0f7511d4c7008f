use uuid::Uuid;

use calhive_core::calendar::{validate_event, Calendar, Event, EventPayload};
use calhive_core::{OperationContext, ServiceError};

use super::CalendarService;
use crate::stores::{EventStore, ReconcileReport};

type Result<T> = std::result::Result<T, ServiceError>;

/// Event operations scoped to a calendar the caller can see.
#[derive(Clone)]
pub struct EventService {
    events: EventStore,
    calendars: CalendarService,
}

impl EventService {
    pub fn new(events: EventStore, calendars: CalendarService) -> Self {
        Self { events, calendars }
    }

    /// Creates an event in `calendar_id`. Requires write access.
    ///
    /// A missing or masked calendar fails with `NotFound` for the calendar
    /// before any row is written.
    pub async fn create_event(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
        payload: EventPayload,
    ) -> Result<Event> {
        let mut calendar = self.writable_calendar(ctx, actor, calendar_id).await?;

        let event = payload.into_event(calendar.id);
        validate_event(&event)?;

        Ok(self
            .events
            .create_event(ctx, &mut calendar, event)
            .await?)
    }

    /// Replaces every content field of an existing event.
    pub async fn edit_event(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
        event_id: Uuid,
        payload: EventPayload,
    ) -> Result<Event> {
        self.writable_calendar(ctx, actor, calendar_id).await?;

        let existing = self.events.find_event(ctx, calendar_id, event_id).await?;
        let event = payload.replace(&existing);
        validate_event(&event)?;

        Ok(self.events.edit_event(ctx, &event).await?)
    }

    pub async fn delete_event(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
        event_id: Uuid,
    ) -> Result<()> {
        self.writable_calendar(ctx, actor, calendar_id).await?;
        Ok(self.events.delete_event(ctx, calendar_id, event_id).await?)
    }

    /// Events of a visible calendar. Empty when it has none.
    pub async fn find_events(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
    ) -> Result<Vec<Event>> {
        self.calendars
            .find_calendar(ctx, actor, calendar_id)
            .await?;
        Ok(self.events.find_events(ctx, calendar_id).await?)
    }

    /// Events indexed under `actor` across every calendar they own.
    ///
    /// Index rows whose event row is gone are skipped.
    pub async fn find_indexed_events(
        &self,
        ctx: &OperationContext,
        actor: &str,
    ) -> Result<Vec<Event>> {
        let entries = self.events.find_indexed_events(ctx, actor).await?;

        let mut events = Vec::with_capacity(entries.len());
        for entry in entries {
            match self
                .events
                .find_event(ctx, entry.calendar_id, entry.event_id)
                .await
            {
                Ok(event) => events.push(event),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(
                        calendar_id = %entry.calendar_id,
                        event_id = %entry.event_id,
                        "Index row points at a missing event"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(events)
    }

    /// Repairs the event index of a calendar. Owner only.
    pub async fn reconcile_index(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
    ) -> Result<ReconcileReport> {
        let calendar = self
            .calendars
            .find_calendar(ctx, actor, calendar_id)
            .await?;
        if !calendar.is_owner(actor) {
            tracing::warn!(%calendar_id, user_id = %actor, "Index reconcile denied");
            return Err(ServiceError::permission_denied(
                "only the owner can reconcile this calendar",
            ));
        }
        Ok(self.events.reconcile_index(ctx, &calendar).await?)
    }

    async fn writable_calendar(
        &self,
        ctx: &OperationContext,
        actor: &str,
        calendar_id: Uuid,
    ) -> Result<Calendar> {
        let calendar = self
            .calendars
            .find_calendar(ctx, actor, calendar_id)
            .await?;
        if !calendar.can_write(actor) {
            tracing::warn!(%calendar_id, user_id = %actor, "Event write denied");
            return Err(ServiceError::permission_denied(
                "write access to this calendar is required",
            ));
        }
        Ok(calendar)
    }
}
