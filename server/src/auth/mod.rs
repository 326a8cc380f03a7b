//! Bearer-token authentication backed by a hosted identity provider.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Serialize;

use crate::config::ConfigError;
use crate::integrations::IntegrationError;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Who the identity provider says the token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token was understood and rejected.
    async fn verify(&self, token: &str) -> Result<Option<Identity>, IntegrationError>;
}

/// Emails granted the admin flag, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AdminList(Vec<String>);

impl AdminList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        )
    }

    pub fn principal(&self, identity: Identity) -> Principal {
        let is_admin = identity
            .email
            .as_deref()
            .map(|email| self.0.iter().any(|admin| admin.eq_ignore_ascii_case(email)))
            .unwrap_or(false);

        Principal {
            uid: identity.uid,
            email: identity.email,
            is_admin,
        }
    }
}

/// Fixed token table for local development, parsed from `token:uid[:email]` entries.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, uid: &str, email: Option<&str>) -> Self {
        self.tokens.insert(
            token.to_string(),
            Identity {
                uid: uid.to_string(),
                email: email.map(str::to_string),
            },
        );
        self
    }

    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        spec.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .try_fold(Self::new(), |provider, entry| {
                let mut parts = entry.splitn(3, ':');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(token), Some(uid), email) if !token.is_empty() && !uid.is_empty() => {
                        Ok(provider.with_token(token, uid, email.filter(|e| !e.is_empty())))
                    }
                    _ => Err(ConfigError::Invalid {
                        key: "AUTH_STATIC_TOKENS",
                        value: entry.to_string(),
                    }),
                }
            })
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Option<Identity>, IntegrationError> {
        Ok(self.tokens.get(token).cloned())
    }
}

/// Extracts the caller from `Authorization: Bearer <token>`; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::AuthError("Missing bearer token".to_string()))?;

        let identity = state
            .identity
            .verify(token)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Identity provider unavailable");
                AppError::AuthError("Unable to verify credentials".to_string())
            })?
            .ok_or_else(|| AppError::AuthError("Invalid or expired token".to_string()))?;

        Ok(AuthUser(state.admins.principal(identity)))
    }
}
