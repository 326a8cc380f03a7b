//! In-memory view of every event and registration, loaded once at startup and
//! kept in step with the store. Writes go to the store first; the cache only
//! changes after the store accepted them.
//!
//! The cache lock is never held across a store call. A new slug is reserved
//! under a short lock and released once the write settles.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{
    Event, EventStats, EventUpdate, NewEvent, NewRegistration, Registration, RegistrationRequest,
    RegistrationSource,
};
use crate::slug::{unique_slug, SlugGenerator};
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("Event '{0}' not found")]
    EventNotFound(String),

    #[error("You do not have permission to modify this event")]
    NotOwner,

    #[error("Registration for this event is closed")]
    RegistrationClosed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Default)]
struct Cache {
    events: Vec<Event>,
    registrations: Vec<Registration>,
    /// Slugs claimed by writes still in flight.
    reserved: HashSet<String>,
}

impl Cache {
    fn slug_taken(&self, slug: &str, except_id: Option<&str>) -> bool {
        self.reserved.contains(slug)
            || self
                .events
                .iter()
                .any(|e| e.slug == slug && Some(e.id.as_str()) != except_id)
    }
}

pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    slugs: SlugGenerator,
    cache: RwLock<Cache>,
}

impl Catalog {
    pub async fn load(store: Arc<dyn DocumentStore>, slugs: SlugGenerator) -> Result<Self, StoreError> {
        let catalog = Self {
            store,
            slugs,
            cache: RwLock::new(Cache::default()),
        };
        catalog.refresh().await?;
        Ok(catalog)
    }

    /// Replaces the cache with a fresh read of the store.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let events = self.store.list_events().await?;
        let registrations = self.store.list_registrations().await?;
        tracing::info!(
            events = events.len(),
            registrations = registrations.len(),
            "Catalog loaded"
        );

        let mut cache = self.cache.write().await;
        cache.events = events;
        cache.registrations = registrations;
        Ok(())
    }

    pub async fn generate_slug(&self, title: &str) -> String {
        self.slugs.generate(title).await
    }

    async fn reserve_slug(&self, base: &str, except_id: Option<&str>) -> String {
        let mut cache = self.cache.write().await;
        let slug = unique_slug(base, |candidate| cache.slug_taken(candidate, except_id));
        cache.reserved.insert(slug.clone());
        slug
    }

    pub async fn add_event(&self, owner: &str, title: &str) -> Result<Event, CatalogError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CatalogError::Validation("Event title is required".to_string()));
        }

        let base = self.slugs.generate(title).await;
        let slug = self.reserve_slug(&base, None).await;

        let inserted = self
            .store
            .insert_event(NewEvent {
                user_id: owner.to_string(),
                title: title.to_string(),
                slug: slug.clone(),
            })
            .await;

        let mut cache = self.cache.write().await;
        cache.reserved.remove(&slug);
        let event = inserted?;

        tracing::info!(event_id = %event.id, slug = %event.slug, owner, "Event created");
        cache.events.push(event.clone());
        Ok(event)
    }

    pub async fn update_event(
        &self,
        owner: &str,
        id: &str,
        update: EventUpdate,
    ) -> Result<Event, CatalogError> {
        let title = update.title.trim().to_string();
        if title.is_empty() {
            return Err(CatalogError::Validation("Event title is required".to_string()));
        }

        let current = self
            .event_by_id(id)
            .await
            .ok_or_else(|| CatalogError::EventNotFound(id.to_string()))?;
        if !current.is_owned_by(owner) {
            return Err(CatalogError::NotOwner);
        }

        let reserved = if title != current.title {
            let base = self.slugs.generate(&title).await;
            Some(self.reserve_slug(&base, Some(id)).await)
        } else {
            None
        };
        let slug = reserved.clone().unwrap_or_else(|| current.slug.clone());

        let event = Event {
            title,
            description: update.description,
            image_url: update.image_url,
            slug,
            venue_name: update.venue_name,
            venue_address: update.venue_address,
            map_link: update.map_link,
            event_date: update.event_date,
            event_time: update.event_time,
            registration_open: update.registration_open,
            ..current
        };
        let saved = self.store.update_event(owner, event).await;

        let mut cache = self.cache.write().await;
        if let Some(slug) = &reserved {
            cache.reserved.remove(slug);
        }
        let saved = saved?;

        match cache.events.iter_mut().find(|e| e.id == saved.id) {
            Some(cached) => *cached = saved.clone(),
            None => cache.events.push(saved.clone()),
        }
        tracing::info!(event_id = %saved.id, "Event updated");
        Ok(saved)
    }

    pub async fn delete_event(&self, owner: &str, id: &str) -> Result<(), CatalogError> {
        let current = self
            .event_by_id(id)
            .await
            .ok_or_else(|| CatalogError::EventNotFound(id.to_string()))?;
        if !current.is_owned_by(owner) {
            return Err(CatalogError::NotOwner);
        }

        let removed = self.store.delete_event(owner, id).await?;

        let mut cache = self.cache.write().await;
        cache.events.retain(|e| e.id != id);
        cache.registrations.retain(|r| r.event_id != id);
        tracing::info!(event_id = id, registrations = removed, "Event deleted");
        Ok(())
    }

    pub async fn event_by_id(&self, id: &str) -> Option<Event> {
        let cache = self.cache.read().await;
        cache.events.iter().find(|e| e.id == id).cloned()
    }

    pub async fn event_by_slug(&self, slug: &str) -> Option<Event> {
        let cache = self.cache.read().await;
        cache.events.iter().find(|e| e.slug == slug).cloned()
    }

    /// The owner's events, newest first.
    pub async fn events_for_owner(&self, owner: &str) -> Vec<Event> {
        let cache = self.cache.read().await;
        let mut events: Vec<Event> = cache
            .events
            .iter()
            .filter(|e| e.is_owned_by(owner))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events
    }

    pub async fn all_events(&self) -> Vec<Event> {
        self.cache.read().await.events.clone()
    }

    /// Public form signup. Duplicate emails for the same event are accepted.
    pub async fn add_registration(
        &self,
        event_id: &str,
        request: RegistrationRequest,
    ) -> Result<Registration, CatalogError> {
        let name = request.name.trim();
        let email = request.email.trim();
        if name.is_empty() {
            return Err(CatalogError::Validation("Name is required".to_string()));
        }
        if !email.contains('@') {
            return Err(CatalogError::Validation("A valid email is required".to_string()));
        }

        let event = self
            .event_by_id(event_id)
            .await
            .ok_or_else(|| CatalogError::EventNotFound(event_id.to_string()))?;
        if !event.registration_open {
            return Err(CatalogError::RegistrationClosed);
        }

        let contact_number = request
            .contact_number
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        self.insert_registration(NewRegistration {
            event_id: event.id,
            name: name.to_string(),
            email: email.to_string(),
            contact_number,
            source: RegistrationSource::Form,
        })
        .await
    }

    /// Tracks a visit through a shared event link.
    pub async fn record_share_visit(&self, event_id: &str) -> Result<Registration, CatalogError> {
        if self.event_by_id(event_id).await.is_none() {
            return Err(CatalogError::EventNotFound(event_id.to_string()));
        }

        self.insert_registration(NewRegistration {
            event_id: event_id.to_string(),
            name: String::new(),
            email: String::new(),
            contact_number: None,
            source: RegistrationSource::SharedLink,
        })
        .await
    }

    async fn insert_registration(
        &self,
        new_registration: NewRegistration,
    ) -> Result<Registration, CatalogError> {
        let registration = self.store.insert_registration(new_registration).await?;
        tracing::info!(
            registration_id = %registration.id,
            event_id = %registration.event_id,
            source = %registration.source,
            "Registration recorded"
        );
        self.cache
            .write()
            .await
            .registrations
            .push(registration.clone());
        Ok(registration)
    }

    /// Guest list for an event: form registrations only.
    pub async fn registrations_for_event(&self, event_id: &str) -> Vec<Registration> {
        let cache = self.cache.read().await;
        cache
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.is_guest())
            .cloned()
            .collect()
    }

    pub async fn event_stats(&self, event_id: &str) -> EventStats {
        let cache = self.cache.read().await;
        cache
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .fold(EventStats::default(), |mut stats, r| {
                match r.source {
                    RegistrationSource::Form => {
                        stats.registrations += 1;
                        if r.checked_in {
                            stats.checked_in += 1;
                        }
                    }
                    RegistrationSource::SharedLink => stats.shared_link_visits += 1,
                }
                stats
            })
    }

    /// Brings a registration changed outside the catalog (a scan) into the cache.
    pub async fn apply_check_in(&self, registration: &Registration) {
        let mut cache = self.cache.write().await;
        match cache.registrations.iter_mut().find(|r| r.id == registration.id) {
            Some(cached) => *cached = registration.clone(),
            None => cache.registrations.push(registration.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    async fn catalog() -> (Arc<MemoryStore>, Catalog) {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::load(store.clone(), SlugGenerator::local_only())
            .await
            .unwrap();
        (store, catalog)
    }

    fn request(name: &str, email: &str) -> RegistrationRequest {
        RegistrationRequest {
            name: name.to_string(),
            email: email.to_string(),
            contact_number: None,
        }
    }

    fn update_from(event: &Event) -> EventUpdate {
        EventUpdate {
            title: event.title.clone(),
            description: event.description.clone(),
            image_url: event.image_url.clone(),
            venue_name: event.venue_name.clone(),
            venue_address: event.venue_address.clone(),
            map_link: event.map_link.clone(),
            event_date: event.event_date.clone(),
            event_time: event.event_time.clone(),
            registration_open: event.registration_open,
        }
    }

    #[tokio::test]
    async fn test_load_reads_existing_documents() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_event(NewEvent {
                user_id: "u1".to_string(),
                title: "Gala".to_string(),
                slug: "gala".to_string(),
            })
            .await
            .unwrap();

        let catalog = Catalog::load(store, SlugGenerator::local_only()).await.unwrap();
        assert!(catalog.event_by_slug("gala").await.is_some());
    }

    #[tokio::test]
    async fn test_add_event_generates_slug_and_caches() {
        let (store, catalog) = catalog().await;

        let event = catalog.add_event("u1", "  Summer Fest!! ").await.unwrap();

        assert_eq!(event.title, "Summer Fest!!");
        assert_eq!(event.slug, "summer-fest");
        assert_eq!(event.user_id, "u1");
        assert!(event.registration_open);
        assert_eq!(catalog.event_by_id(&event.id).await, Some(event.clone()));
        assert_eq!(store.find_event(&event.id).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn test_add_event_requires_title() {
        let (_, catalog) = catalog().await;
        let err = catalog.add_event("u1", "   ").await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_colliding_slugs_get_suffixes() {
        let (_, catalog) = catalog().await;

        let first = catalog.add_event("u1", "Meetup").await.unwrap();
        let second = catalog.add_event("u2", "Meetup!").await.unwrap();
        let third = catalog.add_event("u1", "meetup").await.unwrap();

        assert_eq!(first.slug, "meetup");
        assert_eq!(second.slug, "meetup-2");
        assert_eq!(third.slug, "meetup-3");
        assert_eq!(catalog.event_by_slug("meetup-2").await.unwrap().id, second.id);
    }

    #[tokio::test]
    async fn test_in_flight_slug_is_not_handed_out_twice() {
        let (_, catalog) = catalog().await;

        let pending = catalog.reserve_slug("launch", None).await;
        let event = catalog.add_event("u1", "Launch").await.unwrap();

        assert_eq!(pending, "launch");
        assert_eq!(event.slug, "launch-2");
        let cache = catalog.cache.read().await;
        assert!(cache.reserved.contains("launch"));
        assert!(!cache.reserved.contains("launch-2"));
    }

    #[tokio::test]
    async fn test_failed_update_releases_reserved_slug() {
        let (store, catalog) = catalog().await;
        let event = catalog.add_event("u1", "Launch").await.unwrap();
        store.delete_event("u1", &event.id).await.unwrap();

        let mut update = update_from(&event);
        update.title = "Relaunch".to_string();
        let err = catalog.update_event("u1", &event.id, update).await.unwrap_err();

        assert!(matches!(err, CatalogError::Store(StoreError::NotFound { .. })));
        assert!(catalog.cache.read().await.reserved.is_empty());
    }

    #[tokio::test]
    async fn test_update_regenerates_slug_only_on_title_change() {
        let (_, catalog) = catalog().await;
        let event = catalog.add_event("u1", "Launch Party").await.unwrap();

        let mut update = update_from(&event);
        update.venue_name = "Hall A".to_string();
        let same_title = catalog.update_event("u1", &event.id, update).await.unwrap();
        assert_eq!(same_title.slug, "launch-party");
        assert_eq!(same_title.venue_name, "Hall A");

        let mut update = update_from(&same_title);
        update.title = "Launch Night".to_string();
        let renamed = catalog.update_event("u1", &event.id, update).await.unwrap();
        assert_eq!(renamed.slug, "launch-night");
        assert_eq!(renamed.created_at, event.created_at);
        assert_eq!(catalog.event_by_slug("launch-night").await, Some(renamed));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_refused() {
        let (_, catalog) = catalog().await;
        let event = catalog.add_event("u1", "Launch").await.unwrap();

        let err = catalog
            .update_event("u2", &event.id, update_from(&event))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::NotOwner));
    }

    #[tokio::test]
    async fn test_delete_event_cascades_in_cache_and_store() {
        let (store, catalog) = catalog().await;
        let doomed = catalog.add_event("u1", "Doomed").await.unwrap();
        let kept = catalog.add_event("u1", "Kept").await.unwrap();
        catalog
            .add_registration(&doomed.id, request("Jane", "jane@x.com"))
            .await
            .unwrap();
        catalog.record_share_visit(&doomed.id).await.unwrap();
        let survivor = catalog
            .add_registration(&kept.id, request("Bob", "bob@x.com"))
            .await
            .unwrap();

        catalog.delete_event("u1", &doomed.id).await.unwrap();

        assert!(catalog.event_by_id(&doomed.id).await.is_none());
        assert_eq!(catalog.event_stats(&doomed.id).await, EventStats::default());
        assert_eq!(catalog.registrations_for_event(&kept.id).await, vec![survivor.clone()]);
        assert_eq!(store.list_registrations().await.unwrap(), vec![survivor]);
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_refused() {
        let (_, catalog) = catalog().await;
        let event = catalog.add_event("u1", "Launch").await.unwrap();

        let err = catalog.delete_event("u2", &event.id).await.unwrap_err();

        assert!(matches!(err, CatalogError::NotOwner));
        assert!(catalog.event_by_id(&event.id).await.is_some());
    }

    #[tokio::test]
    async fn test_guest_list_excludes_shared_link_visits() {
        let (_, catalog) = catalog().await;
        let event = catalog.add_event("u1", "Launch").await.unwrap();
        catalog.record_share_visit(&event.id).await.unwrap();
        let jane = catalog
            .add_registration(&event.id, request(" Jane Doe ", "jane@x.com"))
            .await
            .unwrap();
        catalog.record_share_visit(&event.id).await.unwrap();

        let guests = catalog.registrations_for_event(&event.id).await;

        assert_eq!(guests, vec![jane.clone()]);
        assert_eq!(jane.name, "Jane Doe");
        assert!(guests.iter().all(|r| r.source == RegistrationSource::Form));
        assert_eq!(
            catalog.event_stats(&event.id).await,
            EventStats {
                registrations: 1,
                checked_in: 0,
                shared_link_visits: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_duplicate_emails_are_accepted() {
        let (_, catalog) = catalog().await;
        let event = catalog.add_event("u1", "Launch").await.unwrap();

        catalog.add_registration(&event.id, request("Jane", "jane@x.com")).await.unwrap();
        catalog.add_registration(&event.id, request("Jane", "jane@x.com")).await.unwrap();

        assert_eq!(catalog.registrations_for_event(&event.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_registration_validation_and_gate() {
        let (_, catalog) = catalog().await;
        let event = catalog.add_event("u1", "Launch").await.unwrap();

        let err = catalog.add_registration(&event.id, request("", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        let err = catalog.add_registration(&event.id, request("Ann", "nope")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        let err = catalog.add_registration("missing", request("Ann", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, CatalogError::EventNotFound(_)));

        let mut update = update_from(&event);
        update.registration_open = false;
        catalog.update_event("u1", &event.id, update).await.unwrap();
        let err = catalog.add_registration(&event.id, request("Ann", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, CatalogError::RegistrationClosed));
    }

    #[tokio::test]
    async fn test_apply_check_in_updates_cache() {
        let (store, catalog) = catalog().await;
        let event = catalog.add_event("u1", "Launch").await.unwrap();
        let jane = catalog
            .add_registration(&event.id, request("Jane", "jane@x.com"))
            .await
            .unwrap();

        let checked = store.check_in(&jane.id, Utc::now()).await.unwrap().unwrap();
        catalog.apply_check_in(&checked).await;

        assert_eq!(catalog.event_stats(&event.id).await.checked_in, 1);
        assert!(catalog.registrations_for_event(&event.id).await[0].checked_in);
    }

    #[tokio::test]
    async fn test_events_for_owner_newest_first() {
        let (_, catalog) = catalog().await;
        let older = catalog.add_event("u1", "Older").await.unwrap();
        catalog.add_event("u2", "Someone else").await.unwrap();
        let newer = catalog.add_event("u1", "Newer").await.unwrap();

        let ids: Vec<String> = catalog
            .events_for_owner("u1")
            .await
            .into_iter()
            .map(|e| e.id)
            .collect();

        assert_eq!(ids.len(), 2);
        if newer.created_at > older.created_at {
            assert_eq!(ids, vec![newer.id, older.id]);
        }
        assert_eq!(catalog.all_events().await.len(), 3);
    }
}
