//! Persistence port for events and registrations.
//!
//! Ownership is checked here rather than in the handlers: `update_event` and
//! `delete_event` refuse callers whose uid differs from the stored owner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Event, NewEvent, NewRegistration, Registration};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("caller does not own event '{0}'")]
    NotOwner(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn event_not_found(id: &str) -> Self {
        StoreError::NotFound {
            entity: "Event",
            id: id.to_string(),
        }
    }

    pub fn registration_not_found(id: &str) -> Self {
        StoreError::NotFound {
            entity: "Registration",
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    async fn find_event(&self, id: &str) -> Result<Option<Event>, StoreError>;

    async fn insert_event(&self, new_event: NewEvent) -> Result<Event, StoreError>;

    /// Overwrites every mutable field. `id`, `user_id` and `created_at` keep their stored values.
    async fn update_event(&self, owner: &str, event: Event) -> Result<Event, StoreError>;

    /// Deletes the event and every registration pointing at it. Returns the
    /// number of registrations removed.
    async fn delete_event(&self, owner: &str, id: &str) -> Result<u64, StoreError>;

    async fn list_registrations(&self) -> Result<Vec<Registration>, StoreError>;

    async fn find_registration(&self, id: &str) -> Result<Option<Registration>, StoreError>;

    async fn insert_registration(
        &self,
        new_registration: NewRegistration,
    ) -> Result<Registration, StoreError>;

    /// Flips `checked_in` and stamps `checked_in_at`. Returns `None` when the
    /// registration was already checked in, leaving the original timestamp.
    async fn check_in(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Registration>, StoreError>;
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
