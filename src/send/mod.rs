pub mod http;

use serde::Serialize;

use crate::domain::records::AttachmentRef;
use crate::error::MailboxError;

/// A fully rendered message ready for the send API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub recipient: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub attachments: Vec<AttachmentRef>,
}

pub trait EmailSender: Send {
    /// Deliver `email`; returns the provider's message id.
    fn send(&self, email: &OutgoingEmail) -> Result<String, MailboxError>;
}
