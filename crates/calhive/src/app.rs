use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    context::attach_context,
    handlers::{
        calendars::{
            create_calendar, delete_calendar, follow_calendar, get_calendar, list_calendars,
            list_public_calendars, unfollow_calendar, update_calendar,
        },
        events::{
            create_event, delete_event, list_events, list_my_events, reconcile_events,
            update_event,
        },
        health::health,
    },
    state::AppState,
};

const ALLOWED_HEADERS: &str = "Content-Type,Authorization,X-ID-Token";
const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // Preflight handling
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-id-token"),
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/calendars", get(list_calendars).post(create_calendar))
        .route("/calendars/public", get(list_public_calendars))
        .route(
            "/calendars/{calendarId}",
            get(get_calendar)
                .put(update_calendar)
                .delete(delete_calendar),
        )
        .route(
            "/calendars/{calendarId}/follow",
            post(follow_calendar).delete(unfollow_calendar),
        )
        .route(
            "/calendars/{calendarId}/events",
            get(list_events).post(create_event),
        )
        .route(
            "/calendars/{calendarId}/events/reconcile",
            post(reconcile_events),
        )
        .route(
            "/calendars/{calendarId}/events/{eventId}",
            put(update_event).delete(delete_event),
        )
        .route("/events", get(list_my_events))
        .layer(middleware::from_fn_with_state(state.clone(), attach_context))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // API Gateway clients expect these on every response, not only on preflight.
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .with_state(state)
}
