//! QR-coded PDF tickets. Emailed and downloaded tickets come out of the same
//! layout and writer, so both are byte-for-byte the same document.

use thiserror::Error;

use crate::models::{Event, Registration};

pub mod email;
pub mod layout;
pub mod pdf;
pub mod qr;

pub use email::{ticket_email_html, ticket_subject};
pub use layout::{layout_ticket, TicketLayout};
pub use qr::QrMatrix;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("QR encoding failed: {0}")]
    Qr(String),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

/// Everything printed on a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketData {
    pub event_title: String,
    pub schedule: String,
    pub venue_name: String,
    pub venue_address: String,
    pub guest_name: String,
    pub guest_email: String,
    pub ticket_number: String,
}

impl TicketData {
    pub fn new(event: &Event, registration: &Registration) -> Self {
        Self {
            event_title: event.title.clone(),
            schedule: event.schedule_label(),
            venue_name: event.venue_name.clone(),
            venue_address: event.venue_address.clone(),
            guest_name: registration.name.clone(),
            guest_email: registration.email.clone(),
            ticket_number: registration.id.clone(),
        }
    }
}

pub fn ticket_filename(registration: &Registration) -> String {
    format!("ticket-{}.pdf", registration.id)
}

/// Renders the PDF ticket for a registration. The QR payload is the registration id.
pub fn render_ticket(event: &Event, registration: &Registration) -> Result<Vec<u8>, TicketError> {
    let data = TicketData::new(event, registration);
    let qr = QrMatrix::encode(&data.ticket_number)?;
    let layout = layout_ticket(&data, &qr);
    pdf::render_pdf(&layout, &format!("{} ticket", event.title))
}
