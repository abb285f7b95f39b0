use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::domain::records::AttachmentRef;
use crate::error::MailboxError;
use crate::send::{EmailSender, OutgoingEmail};

/// Blocking JSON client for a transactional email API
/// (`POST {from, to, subject, html, text, attachments}` with a bearer key).
pub struct HttpSender {
    client: reqwest::blocking::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Debug, Serialize)]
struct SendPayload<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload>,
}

#[derive(Debug, Serialize, PartialEq)]
struct AttachmentPayload {
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl HttpSender {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        from: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
            from: from.into(),
        })
    }
}

/// Remote references go by URL; local files are inlined as base64.
fn attachment_payload(a: &AttachmentRef) -> Result<AttachmentPayload, MailboxError> {
    if a.is_remote() {
        return Ok(AttachmentPayload {
            filename: a.filename.clone(),
            content: None,
            path: Some(a.path.clone()),
        });
    }
    let bytes = std::fs::read(&a.path)
        .map_err(|e| MailboxError::Provider(format!("cannot read attachment {}: {e}", a.path)))?;
    Ok(AttachmentPayload {
        filename: a.filename.clone(),
        content: Some(general_purpose::STANDARD.encode(bytes)),
        path: None,
    })
}

/// Pull the provider's explanation out of an error body, falling back to the raw text.
fn provider_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<SendResponse>(body) {
        Ok(SendResponse {
            message: Some(m), ..
        }) => m,
        Ok(SendResponse { error: Some(e), .. }) => e,
        _ if body.trim().is_empty() => format!("provider returned {status}"),
        _ => format!("provider returned {status}: {}", body.trim()),
    }
}

impl EmailSender for HttpSender {
    fn send(&self, email: &OutgoingEmail) -> Result<String, MailboxError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(MailboxError::Provider(
                "no API key configured (run `rs_inbox set-api-key`)".into(),
            ));
        };

        let attachments = email
            .attachments
            .iter()
            .map(attachment_payload)
            .collect::<Result<Vec<_>, _>>()?;

        let payload = SendPayload {
            from: &self.from,
            to: vec![email.recipient.as_str()],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            attachments,
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(key)
            .json(&payload)
            .send()
            .map_err(|e| MailboxError::Provider(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| MailboxError::Provider(e.to_string()))?;

        if !status.is_success() {
            return Err(MailboxError::Provider(provider_message(status, &body)));
        }

        let parsed: SendResponse = serde_json::from_str(&body)
            .map_err(|e| MailboxError::Provider(format!("unexpected response: {e}")))?;
        log::info!("send api accepted message to {}", email.recipient);
        Ok(parsed.id.unwrap_or_default())
    }
}
