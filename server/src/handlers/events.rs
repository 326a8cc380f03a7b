use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::owned_event;
use crate::auth::AuthUser;
use crate::models::{CreateEventRequest, EventUpdate};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Deserialize)]
pub struct SlugRequest {
    pub title: String,
}

#[derive(Serialize)]
pub struct SlugPayload {
    pub slug: String,
}

pub async fn preview_slug(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Json(body): Json<SlugRequest>,
) -> Response {
    let slug = state.catalog.generate_slug(&body.title).await;
    success(SlugPayload { slug }, "Slug generated")
}

pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Response {
    let events = state.catalog.events_for_owner(&principal.uid).await;
    success(events, "Events retrieved")
}

/// Every event on the platform; admins only.
pub async fn list_all_events(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Response, AppError> {
    if !principal.is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(success(state.catalog.all_events().await, "Events retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(body): Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    let event = state.catalog.add_event(&principal.uid, &body.title).await?;
    Ok(created(event, "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &principal.uid, &id).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<EventUpdate>,
) -> Result<Response, AppError> {
    let event = state.catalog.update_event(&principal.uid, &id, body).await?;
    Ok(success(event, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    state.catalog.delete_event(&principal.uid, &id).await?;
    Ok(empty_success("Event deleted"))
}

pub async fn event_stats(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &principal.uid, &id).await?;
    Ok(success(state.catalog.event_stats(&event.id).await, "Event stats retrieved"))
}
