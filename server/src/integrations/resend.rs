use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::IntegrationError;

const RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the email and returns the provider's message id.
    async fn send(&self, email: &OutboundEmail) -> Result<String, IntegrationError>;
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    attachments: Vec<AttachmentBody<'a>>,
}

#[derive(Serialize)]
struct AttachmentBody<'a> {
    filename: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    api_url: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self::with_api_url(api_key, from, RESEND_API_URL)
    }

    pub fn with_api_url(
        api_key: impl Into<String>,
        from: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, IntegrationError> {
        let body = SendEmailRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|a| AttachmentBody {
                    filename: &a.filename,
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IntegrationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IntegrationError::from_response(response).await);
        }

        let sent = response
            .json::<SendEmailResponse>()
            .await
            .map_err(|e| IntegrationError::ResponseParseFailed(e.to_string()))?;

        tracing::info!(email_id = %sent.id, to = %email.to, "Email sent");
        Ok(sent.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> OutboundEmail {
        OutboundEmail {
            to: "jane@x.com".to_string(),
            subject: "Your ticket".to_string(),
            html: "<p>hi</p>".to_string(),
            attachments: vec![EmailAttachment {
                filename: "ticket.pdf".to_string(),
                content: b"%PDF".to_vec(),
            }],
        }
    }

    #[tokio::test]
    async fn test_send_encodes_attachment_as_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_key"))
            .and(body_partial_json(json!({
                "from": "tickets@evntos.app",
                "to": ["jane@x.com"],
                "attachments": [{ "filename": "ticket.pdf", "content": "JVBERg==" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = ResendMailer::with_api_url("re_key", "tickets@evntos.app", server.uri());
        assert_eq!(mailer.send(&email()).await.unwrap(), "msg_1");
    }

    #[tokio::test]
    async fn test_send_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let mailer = ResendMailer::with_api_url("re_key", "bad", server.uri());
        match mailer.send(&email()).await.unwrap_err() {
            IntegrationError::ApiError { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "invalid from");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
