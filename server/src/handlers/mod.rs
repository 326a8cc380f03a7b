use axum::response::Response;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::models::Event;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod events;
pub mod guests;
pub mod public;
pub mod scan;
pub mod uploads;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "evntos-api",
    };

    success(payload, "Health check successful")
}

pub async fn current_user(AuthUser(principal): AuthUser) -> Response {
    success(principal, "Authenticated")
}

/// Loads an event from the catalog and checks that the caller owns it.
pub(crate) async fn owned_event(state: &AppState, uid: &str, id: &str) -> Result<Event, AppError> {
    let event = state
        .catalog
        .event_by_id(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{id}' was not found")))?;

    if !event.is_owned_by(uid) {
        return Err(AppError::Forbidden(
            "You do not have permission to access this event".to_string(),
        ));
    }
    Ok(event)
}
