use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::IntegrationError;
use crate::auth::{Identity, IdentityProvider};

const LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
}

/// Resolves Firebase ID tokens through the Identity Toolkit `accounts:lookup` endpoint.
#[derive(Clone)]
pub struct FirebaseIdentity {
    client: Client,
    api_key: String,
    lookup_url: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_lookup_url(api_key, LOOKUP_URL)
    }

    pub fn with_lookup_url(api_key: impl Into<String>, lookup_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            lookup_url: lookup_url.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn verify(&self, token: &str) -> Result<Option<Identity>, IntegrationError> {
        let response = self
            .client
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&LookupRequest { id_token: token })
            .send()
            .await
            .map_err(|e| IntegrationError::RequestFailed(e.to_string()))?;

        // Identity Toolkit answers 400 INVALID_ID_TOKEN for expired or forged tokens.
        if response.status() == StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(IntegrationError::from_response(response).await);
        }

        let body = response
            .json::<LookupResponse>()
            .await
            .map_err(|e| IntegrationError::ResponseParseFailed(e.to_string()))?;

        Ok(body.users.into_iter().next().map(|user| Identity {
            uid: user.local_id,
            email: user.email,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_verify_maps_first_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "web-key"))
            .and(body_json(json!({ "idToken": "good" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "localId": "uid-1", "email": "owner@x.com" }]
            })))
            .mount(&server)
            .await;

        let identity = FirebaseIdentity::with_lookup_url("web-key", server.uri());
        let found = identity.verify("good").await.unwrap().unwrap();

        assert_eq!(found.uid, "uid-1");
        assert_eq!(found.email.as_deref(), Some("owner@x.com"));
    }

    #[tokio::test]
    async fn test_verify_treats_bad_request_as_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "INVALID_ID_TOKEN" }
            })))
            .mount(&server)
            .await;

        let identity = FirebaseIdentity::with_lookup_url("web-key", server.uri());
        assert!(identity.verify("expired").await.unwrap().is_none());
    }
}
