use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distinguishes genuine signups from shared-link visit tracking records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationSource {
    Form,
    SharedLink,
}

impl RegistrationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationSource::Form => "form",
            RegistrationSource::SharedLink => "shared_link",
        }
    }
}

impl fmt::Display for RegistrationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "form" => Ok(RegistrationSource::Form),
            "shared_link" => Ok(RegistrationSource::SharedLink),
            other => Err(format!("unknown registration source '{other}'")),
        }
    }
}

/// A guest's signup for one event. The id is also the ticket number and QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub source: RegistrationSource,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl Registration {
    pub fn is_guest(&self) -> bool {
        self.source == RegistrationSource::Form
    }
}

#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: String,
    pub name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub source: RegistrationSource,
}

/// Body of the public registration form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub contact_number: Option<String>,
}
