use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An organizer-owned event. `user_id` is the auth subject of the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub slug: String,
    pub venue_name: String,
    pub venue_address: String,
    pub map_link: String,
    pub event_date: String,
    pub event_time: String,
    pub registration_open: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Date and time as shown on tickets and emails.
    pub fn schedule_label(&self) -> String {
        match (self.event_date.trim(), self.event_time.trim()) {
            ("", "") => "TBA".to_string(),
            (date, "") => date.to_string(),
            ("", time) => time.to_string(),
            (date, time) => format!("{date} · {time}"),
        }
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.user_id == uid
    }
}

/// Fields the store needs to create an event; everything else starts empty and open.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub user_id: String,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
}

/// Full-document overwrite of the mutable event fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub venue_name: String,
    #[serde(default)]
    pub venue_address: String,
    #[serde(default)]
    pub map_link: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub event_time: String,
    pub registration_open: bool,
}

/// What anonymous visitors of the public event page get to see.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub slug: String,
    pub venue_name: String,
    pub venue_address: String,
    pub map_link: String,
    pub event_date: String,
    pub event_time: String,
    pub registration_open: bool,
}

impl From<Event> for PublicEvent {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            image_url: event.image_url,
            slug: event.slug,
            venue_name: event.venue_name,
            venue_address: event.venue_address,
            map_link: event.map_link,
            event_date: event.event_date,
            event_time: event.event_time,
            registration_open: event.registration_open,
        }
    }
}

/// Per-event counters for the organizer dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub registrations: usize,
    pub checked_in: usize,
    pub shared_link_visits: usize,
}
