use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

/// Relays mail through an HTTP mail gateway authenticated with a bearer token.
pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self { client: Client::new(), api_url, api_key }
    }
}

#[derive(Serialize)]
struct Attachment {
    filename: String,
    content_base64: String,
}

#[derive(Serialize)]
struct OutgoingMail<'a> {
    from_alias: &'a str,
    to_addr: &'a str,
    subject: &'a str,
    html_body: &'a str,
    attachments: Vec<Attachment>,
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        attachment_data: Option<&[u8]>,
    ) -> Result<(), AppError> {
        let attachments = match (attachment_name, attachment_data) {
            (Some(name), Some(data)) => vec![Attachment {
                filename: name.to_string(),
                content_base64: general_purpose::STANDARD.encode(data),
            }],
            _ => Vec::new(),
        };

        let mail = OutgoingMail { from_alias: "bookings", to_addr: recipient, subject, html_body, attachments };
        debug!(recipient, attachments = mail.attachments.len(), "Relaying mail");

        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&mail)
            .send()
            .await
            .map_err(|e| {
                error!(recipient, "Mail gateway unreachable: {}", e);
                AppError::InternalWithMsg(format!("Mail gateway connection error: {}", e))
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            error!(recipient, %status, "Mail gateway rejected message");
            return Err(AppError::InternalWithMsg(format!("Mail gateway returned {}: {}", status, text)));
        }

        Ok(())
    }
}
