use crate::models::{Event, Registration};

pub fn ticket_subject(event: &Event) -> String {
    format!("Your ticket for {}", event.title)
}

/// HTML body of the confirmation email that carries the PDF ticket.
pub fn ticket_email_html(event: &Event, registration: &Registration) -> String {
    let venue = [event.venue_name.trim(), event.venue_address.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(escape_html)
        .collect::<Vec<_>>()
        .join(", ");
    let venue_row = if venue.is_empty() {
        String::new()
    } else {
        format!("<p><strong>Venue:</strong> {venue}</p>")
    };

    format!(
        "<div style=\"font-family:Helvetica,Arial,sans-serif;max-width:560px;margin:0 auto\">\
         <h1 style=\"font-size:22px\">You're registered for {title}!</h1>\
         <p>Hi {name},</p>\
         <p>Thanks for registering. Your ticket is attached to this email as a PDF. \
         Show the QR code at the entrance to check in.</p>\
         <p><strong>When:</strong> {schedule}</p>\
         {venue_row}\
         <p><strong>Ticket number:</strong> {ticket}</p>\
         </div>",
        title = escape_html(&event.title),
        name = escape_html(&registration.name),
        schedule = escape_html(&event.schedule_label()),
        ticket = escape_html(&registration.id),
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistrationSource;
    use chrono::Utc;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_email_escapes_guest_input() {
        let event = Event {
            id: "e1".to_string(),
            user_id: "u1".to_string(),
            title: "Rock & Roll".to_string(),
            description: String::new(),
            image_url: String::new(),
            slug: "rock-roll".to_string(),
            venue_name: String::new(),
            venue_address: String::new(),
            map_link: String::new(),
            event_date: "2025-07-01".to_string(),
            event_time: String::new(),
            registration_open: true,
            created_at: Utc::now(),
        };
        let registration = Registration {
            id: "r1".to_string(),
            event_id: "e1".to_string(),
            name: "<script>alert(1)</script>".to_string(),
            email: "x@x.com".to_string(),
            contact_number: None,
            registered_at: Utc::now(),
            source: RegistrationSource::Form,
            checked_in: false,
            checked_in_at: None,
        };

        let html = ticket_email_html(&event, &registration);
        assert!(html.contains("Rock &amp; Roll"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("Venue:"));
        assert_eq!(ticket_subject(&event), "Your ticket for Rock & Roll");
    }
}
