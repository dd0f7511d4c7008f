use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use calhive_core::calendar::{Calendar, CreateCalendarRequest, UpdateCalendarRequest};

use super::{message, AppError, JsonBody, PathParams};
use crate::{context::RequestContext, identity::CurrentUser, state::AppState};

/// List the caller's calendars (GET /calendars).
pub async fn list_calendars(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Calendar>>, AppError> {
    let calendars = state.calendars.find_calendars(&ctx, &user.user_id).await?;
    Ok(Json(calendars))
}

/// List every public calendar (GET /calendars/public).
pub async fn list_public_calendars(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(_): CurrentUser,
) -> Result<Json<Vec<Calendar>>, AppError> {
    let calendars = state.calendars.find_public_calendars(&ctx).await?;
    Ok(Json(calendars))
}

/// Create a calendar owned by the caller (POST /calendars).
pub async fn create_calendar(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<CreateCalendarRequest>,
) -> Result<impl IntoResponse, AppError> {
    let calendar = state
        .calendars
        .create_calendar(&ctx, &user.user_id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "calendarId": calendar.id })),
    ))
}

/// Get a single calendar by ID (GET /calendars/{calendarId}).
pub async fn get_calendar(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams(calendar_id): PathParams<Uuid>,
) -> Result<Json<Calendar>, AppError> {
    let calendar = state
        .calendars
        .find_calendar(&ctx, &user.user_id, calendar_id)
        .await?;
    Ok(Json(calendar))
}

/// Update a calendar by ID (PUT /calendars/{calendarId}).
pub async fn update_calendar(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams(calendar_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<UpdateCalendarRequest>,
) -> Result<Json<Calendar>, AppError> {
    let calendar = state
        .calendars
        .edit_calendar(&ctx, &user.user_id, calendar_id, payload)
        .await?;
    Ok(Json(calendar))
}

/// Delete a calendar by ID (DELETE /calendars/{calendarId}).
///
/// Also deletes its events and memberships.
pub async fn delete_calendar(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams(calendar_id): PathParams<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .calendars
        .delete_calendar(&ctx, &user.user_id, calendar_id)
        .await?;
    Ok(message("Calendar deleted"))
}

/// Follow a public calendar (POST /calendars/{calendarId}/follow).
pub async fn follow_calendar(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams(calendar_id): PathParams<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .calendars
        .follow_calendar(&ctx, calendar_id, &user.user_id)
        .await?;
    Ok(message("Calendar followed"))
}

/// Stop following a calendar (DELETE /calendars/{calendarId}/follow).
pub async fn unfollow_calendar(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    CurrentUser(user): CurrentUser,
    PathParams(calendar_id): PathParams<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .calendars
        .unfollow_calendar(&ctx, calendar_id, &user.user_id)
        .await?;
    Ok(message("Calendar unfollowed"))
}
