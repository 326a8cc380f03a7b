pub mod event;
pub mod registration;

pub use event::{CreateEventRequest, Event, EventStats, EventUpdate, NewEvent, PublicEvent};
pub use registration::{NewRegistration, Registration, RegistrationRequest, RegistrationSource};
