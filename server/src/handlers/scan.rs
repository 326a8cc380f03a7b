use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::owned_event;
use crate::auth::AuthUser;
use crate::scan::{verify_ticket, ScanOutcome, ScanReport};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Text decoded from the QR code.
    pub code: String,
}

pub async fn scan_ticket(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ScanRequest>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &principal.uid, &id).await?;

    let outcome = verify_ticket(state.store.as_ref(), &body.code, &event.id, Utc::now()).await;
    if let ScanOutcome::CheckedIn { registration, .. } = &outcome {
        state.catalog.apply_check_in(registration).await;
    }

    let report = ScanReport::from(outcome);
    let message = report.message.clone();
    Ok(success(report, message))
}
