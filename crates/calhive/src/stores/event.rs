use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use calhive_core::calendar::{Calendar, Event};
use calhive_core::storage::{
    event_index_to_item, event_to_item, item_to_event, item_to_event_index, keys,
    EventIndexEntry, RepositoryError, Result, Table, WriteCondition,
};
use calhive_core::OperationContext;

/// Outcome of [`EventStore::reconcile_index`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Index rows written for events that had none.
    pub restored: usize,
    /// Index rows deleted because their event row is gone.
    pub removed: usize,
}

/// Persists events as independent rows in their calendar's partition.
///
/// Each event has a primary `EVENT#<event_id>` row and an index row
/// `CAL#<calendar_id>#<event_id>` carrying the calendar owner's user key.
/// The two are written one after the other, never atomically.
#[derive(Clone)]
pub struct EventStore {
    table: Arc<dyn Table>,
}

fn event_not_found(event_id: Uuid) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: "Event",
        id: event_id.to_string(),
    }
}

fn scoped_not_found(err: RepositoryError, event_id: Uuid) -> RepositoryError {
    match err {
        RepositoryError::NotFound { .. } => event_not_found(event_id),
        other => other,
    }
}

impl EventStore {
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self { table }
    }

    /// Writes the event row, then its index row, and appends the event to
    /// `calendar.events`.
    ///
    /// If the index write fails the event row stays behind without an index
    /// row; the error is returned and `calendar` is left unchanged.
    /// [`reconcile_index`](Self::reconcile_index) repairs that state.
    pub async fn create_event(
        &self,
        ctx: &OperationContext,
        calendar: &mut Calendar,
        mut event: Event,
    ) -> Result<Event> {
        event.calendar_id = calendar.id;

        ctx.run(
            self.table
                .put_item(event_to_item(&event), WriteCondition::MustNotExist),
        )
        .await?;

        let index = event_index_to_item(&event, &calendar.owner_user_id);
        let index_sk = index.sk.clone();
        if let Err(err) = ctx.run(self.table.put_item(index, WriteCondition::None)).await {
            tracing::error!(
                calendar_id = %calendar.id,
                event_id = %event.id,
                pk = %keys::calendar_pk(calendar.id),
                event_sk = %keys::event_sk(event.id),
                index_sk = %index_sk,
                error = %err,
                "Event row written but index row failed"
            );
            return Err(err);
        }

        calendar.events.push(event.clone());
        tracing::info!(calendar_id = %calendar.id, event_id = %event.id, "Created event");
        Ok(event)
    }

    /// All events of a calendar, in no particular order.
    pub async fn find_events(&self, ctx: &OperationContext, calendar_id: Uuid) -> Result<Vec<Event>> {
        let rows = ctx
            .run(
                self.table
                    .query_by_prefix(&keys::calendar_pk(calendar_id), keys::EVENT_PREFIX),
            )
            .await?;
        rows.iter().map(item_to_event).collect()
    }

    pub async fn find_event(
        &self,
        ctx: &OperationContext,
        calendar_id: Uuid,
        event_id: Uuid,
    ) -> Result<Event> {
        let item = ctx
            .run(
                self.table
                    .get_item(&keys::calendar_pk(calendar_id), &keys::event_sk(event_id)),
            )
            .await?
            .ok_or_else(|| event_not_found(event_id))?;
        item_to_event(&item)
    }

    /// Replaces an existing event row. Fails with `NotFound` if the event
    /// does not exist.
    pub async fn edit_event(&self, ctx: &OperationContext, event: &Event) -> Result<Event> {
        ctx.run(
            self.table
                .put_item(event_to_item(event), WriteCondition::MustExist),
        )
        .await
        .map_err(|err| scoped_not_found(err, event.id))?;

        tracing::info!(calendar_id = %event.calendar_id, event_id = %event.id, "Updated event");
        Ok(event.clone())
    }

    /// Removes the event row, then its index row.
    pub async fn delete_event(
        &self,
        ctx: &OperationContext,
        calendar_id: Uuid,
        event_id: Uuid,
    ) -> Result<()> {
        let pk = keys::calendar_pk(calendar_id);

        ctx.run(
            self.table
                .delete_item(&pk, &keys::event_sk(event_id), WriteCondition::MustExist),
        )
        .await
        .map_err(|err| scoped_not_found(err, event_id))?;

        let index_sk = keys::event_index_sk(calendar_id, event_id);
        if let Err(err) = ctx
            .run(self.table.delete_item(&pk, &index_sk, WriteCondition::None))
            .await
        {
            tracing::error!(
                %calendar_id,
                %event_id,
                pk = %pk,
                index_sk = %index_sk,
                error = %err,
                "Event row deleted but index row remains"
            );
            return Err(err);
        }

        tracing::info!(%calendar_id, %event_id, "Deleted event");
        Ok(())
    }

    /// Event references indexed under `user_id`, across all calendars.
    pub async fn find_indexed_events(
        &self,
        ctx: &OperationContext,
        user_id: &str,
    ) -> Result<Vec<EventIndexEntry>> {
        let rows = ctx
            .run(
                self.table
                    .query_user_index(&keys::user_index_key(user_id), keys::EVENT_INDEX_PREFIX),
            )
            .await?;
        rows.iter().map(item_to_event_index).collect()
    }

    /// Brings the index rows of `calendar` back in line with its event rows.
    pub async fn reconcile_index(
        &self,
        ctx: &OperationContext,
        calendar: &Calendar,
    ) -> Result<ReconcileReport> {
        let pk = keys::calendar_pk(calendar.id);
        let events = self.find_events(ctx, calendar.id).await?;
        let index_rows = ctx
            .run(self.table.query_by_prefix(&pk, keys::EVENT_INDEX_PREFIX))
            .await?;

        let indexed: HashSet<Uuid> = index_rows
            .iter()
            .filter_map(|row| keys::parse_event_index_sk(&row.sk).map(|(_, event_id)| event_id))
            .collect();
        let live: HashSet<Uuid> = events.iter().map(|e| e.id).collect();

        let mut report = ReconcileReport::default();

        for event in events.iter().filter(|e| !indexed.contains(&e.id)) {
            let item = event_index_to_item(event, &calendar.owner_user_id);
            ctx.run(self.table.put_item(item, WriteCondition::None))
                .await?;
            report.restored += 1;
        }

        for row in &index_rows {
            let stale = keys::parse_event_index_sk(&row.sk)
                .is_none_or(|(_, event_id)| !live.contains(&event_id));
            if stale {
                ctx.run(self.table.delete_item(&pk, &row.sk, WriteCondition::None))
                    .await?;
                report.removed += 1;
            }
        }

        if report != ReconcileReport::default() {
            tracing::warn!(
                calendar_id = %calendar.id,
                restored = report.restored,
                removed = report.removed,
                "Reconciled event index"
            );
        }
        Ok(report)
    }
}
