use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::IntegrationError;
use crate::slug::SlugSource;

#[derive(Serialize)]
struct FlowRequest<'a> {
    data: FlowInput<'a>,
}

#[derive(Serialize)]
struct FlowInput<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct FlowResponse {
    result: String,
}

/// Calls a deployed Genkit flow that turns an event title into a slug.
#[derive(Clone)]
pub struct GenkitSlugClient {
    client: Client,
    flow_url: String,
    api_key: Option<String>,
}

impl GenkitSlugClient {
    pub fn new(flow_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            flow_url: flow_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl SlugSource for GenkitSlugClient {
    async fn suggest(&self, title: &str) -> Result<String, IntegrationError> {
        let mut request = self.client.post(&self.flow_url).json(&FlowRequest {
            data: FlowInput { title },
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IntegrationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IntegrationError::from_response(response).await);
        }

        let body = response
            .json::<FlowResponse>()
            .await
            .map_err(|e| IntegrationError::ResponseParseFailed(e.to_string()))?;

        tracing::debug!(slug = %body.result, "Slug suggested by Genkit flow");
        Ok(body.result)
    }
}
