//! Unauthenticated endpoints behind the public event page.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use super::guests::pdf_response;
use crate::integrations::{EmailAttachment, OutboundEmail};
use crate::models::{Event, PublicEvent, Registration, RegistrationRequest};
use crate::state::AppState;
use crate::tickets::{render_ticket, ticket_email_html, ticket_filename, ticket_subject};
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub registration: Registration,
    pub ticket_emailed: bool,
}

async fn event_for_slug(state: &AppState, slug: &str) -> Result<Event, AppError> {
    state
        .catalog
        .event_by_slug(slug)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Event '{slug}' was not found")))
}

pub async fn get_public_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let event = event_for_slug(&state, &slug).await?;
    Ok(success(PublicEvent::from(event), "Event retrieved"))
}

pub async fn register(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<RegistrationRequest>,
) -> Result<Response, AppError> {
    let event = event_for_slug(&state, &slug).await?;
    let registration = state.catalog.add_registration(&event.id, body).await?;
    let ticket_emailed = email_ticket(&state, &event, &registration).await;

    Ok(created(
        RegistrationReceipt {
            registration,
            ticket_emailed,
        },
        "Registration successful",
    ))
}

/// Best effort: a failed email is logged and the registration stands.
async fn email_ticket(state: &AppState, event: &Event, registration: &Registration) -> bool {
    let pdf = match render_ticket(event, registration) {
        Ok(pdf) => pdf,
        Err(e) => {
            tracing::error!(error = %e, registration_id = %registration.id, "Ticket rendering failed");
            return false;
        }
    };

    let email = OutboundEmail {
        to: registration.email.clone(),
        subject: ticket_subject(event),
        html: ticket_email_html(event, registration),
        attachments: vec![EmailAttachment {
            filename: ticket_filename(registration),
            content: pdf,
        }],
    };

    match state.mailer.send(&email).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, registration_id = %registration.id, "Ticket email not sent");
            false
        }
    }
}

pub async fn record_visit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let event = event_for_slug(&state, &slug).await?;
    state.catalog.record_share_visit(&event.id).await?;
    Ok(empty_success("Visit recorded"))
}

/// Guest-side download. Knowing the registration id is the only credential,
/// the same as presenting the QR code.
pub async fn download_ticket(
    State(state): State<AppState>,
    Path(registration_id): Path<String>,
) -> Result<Response, AppError> {
    let not_found =
        || AppError::NotFound(format!("Ticket '{registration_id}' was not found"));

    let registration = state
        .store
        .find_registration(&registration_id)
        .await?
        .filter(Registration::is_guest)
        .ok_or_else(not_found)?;

    let event = match state.catalog.event_by_id(&registration.event_id).await {
        Some(event) => event,
        None => state
            .store
            .find_event(&registration.event_id)
            .await?
            .ok_or_else(not_found)?,
    };

    pdf_response(&event, &registration)
}
