use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{new_document_id, DocumentStore, StoreError};
use crate::models::{Event, NewEvent, NewRegistration, Registration};

#[derive(Default)]
struct Tables {
    events: Vec<Event>,
    registrations: Vec<Registration>,
}

/// Process-local store used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.tables.read().await.events.clone())
    }

    async fn find_event(&self, id: &str) -> Result<Option<Event>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.events.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_event(&self, new_event: NewEvent) -> Result<Event, StoreError> {
        let event = Event {
            id: new_document_id(),
            user_id: new_event.user_id,
            title: new_event.title,
            description: String::new(),
            image_url: String::new(),
            slug: new_event.slug,
            venue_name: String::new(),
            venue_address: String::new(),
            map_link: String::new(),
            event_date: String::new(),
            event_time: String::new(),
            registration_open: true,
            created_at: Utc::now(),
        };
        self.tables.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, owner: &str, event: Event) -> Result<Event, StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| StoreError::event_not_found(&event.id))?;

        if stored.user_id != owner {
            return Err(StoreError::NotOwner(event.id));
        }

        *stored = Event {
            user_id: stored.user_id.clone(),
            created_at: stored.created_at,
            ..event
        };
        Ok(stored.clone())
    }

    async fn delete_event(&self, owner: &str, id: &str) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let position = tables
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::event_not_found(id))?;

        if tables.events[position].user_id != owner {
            return Err(StoreError::NotOwner(id.to_string()));
        }

        tables.events.remove(position);
        let before = tables.registrations.len();
        tables.registrations.retain(|r| r.event_id != id);
        Ok((before - tables.registrations.len()) as u64)
    }

    async fn list_registrations(&self) -> Result<Vec<Registration>, StoreError> {
        Ok(self.tables.read().await.registrations.clone())
    }

    async fn find_registration(&self, id: &str) -> Result<Option<Registration>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.registrations.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_registration(
        &self,
        new_registration: NewRegistration,
    ) -> Result<Registration, StoreError> {
        let registration = Registration {
            id: new_document_id(),
            event_id: new_registration.event_id,
            name: new_registration.name,
            email: new_registration.email,
            contact_number: new_registration.contact_number,
            registered_at: Utc::now(),
            source: new_registration.source,
            checked_in: false,
            checked_in_at: None,
        };
        self.tables
            .write()
            .await
            .registrations
            .push(registration.clone());
        Ok(registration)
    }

    async fn check_in(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Registration>, StoreError> {
        let mut tables = self.tables.write().await;
        let registration = tables
            .registrations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::registration_not_found(id))?;

        if registration.checked_in {
            return Ok(None);
        }

        registration.checked_in = true;
        registration.checked_in_at = Some(at);
        Ok(Some(registration.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistrationSource;

    fn new_event(owner: &str, slug: &str) -> NewEvent {
        NewEvent {
            user_id: owner.to_string(),
            title: slug.to_string(),
            slug: slug.to_string(),
        }
    }

    fn new_registration(event_id: &str, source: RegistrationSource) -> NewRegistration {
        NewRegistration {
            event_id: event_id.to_string(),
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            contact_number: None,
            source,
        }
    }

    #[tokio::test]
    async fn test_insert_event_defaults_to_open_and_empty() {
        let store = MemoryStore::new();
        let event = store.insert_event(new_event("u1", "launch")).await.unwrap();

        assert!(event.registration_open);
        assert!(event.description.is_empty());
        assert_eq!(store.find_event(&event.id).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn test_update_event_rejects_other_owner() {
        let store = MemoryStore::new();
        let mut event = store.insert_event(new_event("u1", "launch")).await.unwrap();
        event.title = "Hijacked".to_string();

        let err = store.update_event("u2", event.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotOwner(_)));

        let stored = store.find_event(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "launch");
    }

    #[tokio::test]
    async fn test_update_event_keeps_owner_and_created_at() {
        let store = MemoryStore::new();
        let event = store.insert_event(new_event("u1", "launch")).await.unwrap();
        let mut changed = event.clone();
        changed.user_id = "u2".to_string();
        changed.venue_name = "Hall A".to_string();

        let updated = store.update_event("u1", changed).await.unwrap();
        assert_eq!(updated.user_id, "u1");
        assert_eq!(updated.created_at, event.created_at);
        assert_eq!(updated.venue_name, "Hall A");
    }

    #[tokio::test]
    async fn test_delete_event_cascades_only_its_registrations() {
        let store = MemoryStore::new();
        let doomed = store.insert_event(new_event("u1", "a")).await.unwrap();
        let kept = store.insert_event(new_event("u1", "b")).await.unwrap();
        store
            .insert_registration(new_registration(&doomed.id, RegistrationSource::Form))
            .await
            .unwrap();
        store
            .insert_registration(new_registration(&doomed.id, RegistrationSource::SharedLink))
            .await
            .unwrap();
        let survivor = store
            .insert_registration(new_registration(&kept.id, RegistrationSource::Form))
            .await
            .unwrap();

        let removed = store.delete_event("u1", &doomed.id).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.list_registrations().await.unwrap(), vec![survivor]);
        assert_eq!(store.list_events().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_delete_event_by_non_owner_keeps_everything() {
        let store = MemoryStore::new();
        let event = store.insert_event(new_event("u1", "a")).await.unwrap();
        store
            .insert_registration(new_registration(&event.id, RegistrationSource::Form))
            .await
            .unwrap();

        let err = store.delete_event("u2", &event.id).await.unwrap_err();

        assert!(matches!(err, StoreError::NotOwner(_)));
        assert_eq!(store.list_registrations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_check_in_only_stamps_first_time() {
        let store = MemoryStore::new();
        let registration = store
            .insert_registration(new_registration("e1", RegistrationSource::Form))
            .await
            .unwrap();
        let first = Utc::now();

        let checked = store.check_in(&registration.id, first).await.unwrap().unwrap();
        assert!(checked.checked_in);
        assert_eq!(checked.checked_in_at, Some(first));

        let later = first + chrono::Duration::minutes(5);
        assert_eq!(store.check_in(&registration.id, later).await.unwrap(), None);
        let stored = store.find_registration(&registration.id).await.unwrap().unwrap();
        assert_eq!(stored.checked_in_at, Some(first));
    }

    #[tokio::test]
    async fn test_check_in_unknown_registration_is_not_found() {
        let store = MemoryStore::new();
        let err = store.check_in("missing", Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
