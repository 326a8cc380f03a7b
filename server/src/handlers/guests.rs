use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::owned_event;
use crate::auth::AuthUser;
use crate::export::{guest_list_csv, GuestList};
use crate::models::{Event, Registration};
use crate::state::AppState;
use crate::tickets::{render_ticket, ticket_filename};
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub verified: bool,
}

pub async fn list_guests(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &principal.uid, &id).await?;
    let guests = state.catalog.registrations_for_event(&event.id).await;
    Ok(success(guests, "Registrations retrieved"))
}

pub async fn export_guests(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &principal.uid, &id).await?;
    let list = if query.verified {
        GuestList::Verified
    } else {
        GuestList::All
    };

    let guests = state.catalog.registrations_for_event(&event.id).await;
    let csv = guest_list_csv(&guests, list);
    let disposition = format!("attachment; filename=\"{}\"", list.filename(&event.slug));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// Organizer-side ticket download.
pub async fn guest_ticket(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path((id, registration_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &principal.uid, &id).await?;
    let registration = state
        .store
        .find_registration(&registration_id)
        .await?
        .filter(|r| r.event_id == event.id)
        .ok_or_else(|| {
            AppError::NotFound(format!("Registration with id '{registration_id}' was not found"))
        })?;

    pdf_response(&event, &registration)
}

pub(crate) fn pdf_response(event: &Event, registration: &Registration) -> Result<Response, AppError> {
    let pdf = render_ticket(event, registration)?;
    let disposition = format!("attachment; filename=\"{}\"", ticket_filename(registration));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}
