//! HTTP clients for the hosted services the platform leans on: Genkit for
//! slug suggestions, Resend for ticket emails, ImageKit for event images and
//! Firebase for identity.

use async_trait::async_trait;
use thiserror::Error;

pub mod firebase;
pub mod genkit;
pub mod imagekit;
pub mod resend;

pub use firebase::FirebaseIdentity;
pub use genkit::GenkitSlugClient;
pub use imagekit::{ImageHost, ImageKitClient, ImageUpload};
pub use resend::{EmailAttachment, Mailer, OutboundEmail, ResendMailer};

use crate::auth::{Identity, IdentityProvider};

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },
}

impl IntegrationError {
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        IntegrationError::ApiError { status, message }
    }
}

/// Stand-in for a service whose credentials are absent. Every call fails with
/// [`IntegrationError::NotConfigured`].
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured(pub &'static str);

#[async_trait]
impl Mailer for Unconfigured {
    async fn send(&self, _email: &OutboundEmail) -> Result<String, IntegrationError> {
        Err(IntegrationError::NotConfigured(self.0))
    }
}

#[async_trait]
impl ImageHost for Unconfigured {
    async fn upload(&self, _upload: ImageUpload) -> Result<serde_json::Value, IntegrationError> {
        Err(IntegrationError::NotConfigured(self.0))
    }
}

#[async_trait]
impl IdentityProvider for Unconfigured {
    async fn verify(&self, _token: &str) -> Result<Option<Identity>, IntegrationError> {
        Err(IntegrationError::NotConfigured(self.0))
    }
}
