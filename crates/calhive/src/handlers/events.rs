use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use calhive_core::calendar::{Event, EventPayload};

use super::{message, AppError, JsonBody, PathParams};
use crate::{
    context::RequestContext, identity::CurrentUser, state::AppState, stores::ReconcileReport,
};

/// List events of a calendar (GET /calendars/{calendarId}/events).
pub async fn list_events(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams(calendar_id): PathParams<Uuid>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = state
        .events
        .find_events(&ctx, &user.user_id, calendar_id)
        .await?;
    Ok(Json(events))
}

/// Create an event (POST /calendars/{calendarId}/events).
pub async fn create_event(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams(calendar_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    let event = state
        .events
        .create_event(&ctx, &user.user_id, calendar_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Replace an event (PUT /calendars/{calendarId}/events/{eventId}).
pub async fn update_event(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams((calendar_id, event_id)): PathParams<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<EventPayload>,
) -> Result<Json<Event>, AppError> {
    let event = state
        .events
        .edit_event(&ctx, &user.user_id, calendar_id, event_id, payload)
        .await?;
    Ok(Json(event))
}

/// Delete an event (DELETE /calendars/{calendarId}/events/{eventId}).
pub async fn delete_event(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams((calendar_id, event_id)): PathParams<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .events
        .delete_event(&ctx, &user.user_id, calendar_id, event_id)
        .await?;
    Ok(message("Event deleted"))
}

/// Events across the calendars the caller owns (GET /events).
pub async fn list_my_events(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.events.find_indexed_events(&ctx, &user.user_id).await?;
    Ok(Json(events))
}

/// Repair a calendar's event index (POST /calendars/{calendarId}/events/reconcile).
pub async fn reconcile_events(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams(calendar_id): PathParams<Uuid>,
) -> Result<Json<ReconcileReport>, AppError> {
    let report = state
        .events
        .reconcile_index(&ctx, &user.user_id, calendar_id)
        .await?;
    Ok(Json(report))
}
