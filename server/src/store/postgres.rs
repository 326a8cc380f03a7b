use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use super::{new_document_id, DocumentStore, StoreError};
use crate::models::{Event, NewEvent, NewRegistration, Registration};

const EVENT_COLUMNS: &str = "id, user_id, title, description, image_url, slug, venue_name, \
     venue_address, map_link, event_date, event_time, registration_open, created_at";

const REGISTRATION_COLUMNS: &str = "id, event_id, name, email, contact_number, registered_at, \
     source, checked_in, checked_in_at";

#[derive(FromRow)]
struct RegistrationRow {
    id: String,
    event_id: String,
    name: String,
    email: String,
    contact_number: Option<String>,
    registered_at: DateTime<Utc>,
    source: String,
    checked_in: bool,
    checked_in_at: Option<DateTime<Utc>>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = StoreError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        let source = row
            .source
            .parse()
            .map_err(|e: String| StoreError::Corrupt(format!("registration {}: {e}", row.id)))?;

        Ok(Registration {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            email: row.email,
            contact_number: row.contact_number,
            registered_at: row.registered_at,
            source,
            checked_in: row.checked_in,
            checked_in_at: row.checked_in_at,
        })
    }
}

/// Postgres-backed store. Tables are created by the migrations in `server/migrations`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!("Successfully connected to database");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await?;
        tracing::info!("Migrations run successfully");
        Ok(())
    }

    async fn owner_of(&self, event_id: &str) -> Result<Option<String>, StoreError> {
        let owner = sqlx::query_scalar::<_, String>("SELECT user_id FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn ownership_error(&self, event_id: &str) -> StoreError {
        match self.owner_of(event_id).await {
            Ok(Some(_)) => StoreError::NotOwner(event_id.to_string()),
            Ok(None) => StoreError::event_not_found(event_id),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at");
        let events = sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn find_event(&self, id: &str) -> Result<Option<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn insert_event(&self, new_event: NewEvent) -> Result<Event, StoreError> {
        let sql = format!(
            "INSERT INTO events (id, user_id, title, slug, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EVENT_COLUMNS}"
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(new_document_id())
            .bind(&new_event.user_id)
            .bind(&new_event.title)
            .bind(&new_event.slug)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update_event(&self, owner: &str, event: Event) -> Result<Event, StoreError> {
        let sql = format!(
            "UPDATE events SET title = $3, description = $4, image_url = $5, slug = $6, \
             venue_name = $7, venue_address = $8, map_link = $9, event_date = $10, \
             event_time = $11, registration_open = $12 \
             WHERE id = $1 AND user_id = $2 RETURNING {EVENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Event>(&sql)
            .bind(&event.id)
            .bind(owner)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.image_url)
            .bind(&event.slug)
            .bind(&event.venue_name)
            .bind(&event.venue_address)
            .bind(&event.map_link)
            .bind(&event.event_date)
            .bind(&event.event_time)
            .bind(event.registration_open)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(updated) => Ok(updated),
            None => Err(self.ownership_error(&event.id).await),
        }
    }

    async fn delete_event(&self, owner: &str, id: &str) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(self.ownership_error(id).await);
        }

        let cascaded = sqlx::query("DELETE FROM registrations WHERE event_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(cascaded)
    }

    async fn list_registrations(&self) -> Result<Vec<Registration>, StoreError> {
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations ORDER BY registered_at");
        sqlx::query_as::<_, RegistrationRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Registration::try_from)
            .collect()
    }

    async fn find_registration(&self, id: &str) -> Result<Option<Registration>, StoreError> {
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1");
        sqlx::query_as::<_, RegistrationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Registration::try_from)
            .transpose()
    }

    async fn insert_registration(
        &self,
        new_registration: NewRegistration,
    ) -> Result<Registration, StoreError> {
        let sql = format!(
            "INSERT INTO registrations (id, event_id, name, email, contact_number, registered_at, source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {REGISTRATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RegistrationRow>(&sql)
            .bind(new_document_id())
            .bind(&new_registration.event_id)
            .bind(&new_registration.name)
            .bind(&new_registration.email)
            .bind(&new_registration.contact_number)
            .bind(Utc::now())
            .bind(new_registration.source.as_str())
            .fetch_one(&self.pool)
            .await?;
        Registration::try_from(row)
    }

    async fn check_in(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Registration>, StoreError> {
        let sql = format!(
            "UPDATE registrations SET checked_in = TRUE, checked_in_at = $2 \
             WHERE id = $1 AND NOT checked_in RETURNING {REGISTRATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RegistrationRow>(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Registration::try_from(row).map(Some),
            None if self.find_registration(id).await?.is_some() => Ok(None),
            None => Err(StoreError::registration_not_found(id)),
        }
    }
}
