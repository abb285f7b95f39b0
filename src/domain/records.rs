use serde::{Deserialize, Serialize};

pub type RecordId = String;

/// A file attached to a message: a local path or an http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    pub path: String,
}

impl AttachmentRef {
    /// Build a reference from a path or URL, taking the last segment as filename.
    pub fn from_path(path: &str) -> Self {
        let path = path.trim();
        let filename = path
            .trim_end_matches('/')
            .rsplit(['/', '\\'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("attachment")
            .to_string();
        Self {
            filename,
            path: path.to_string(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }
}

/// A contact-form message delivered by the inbound webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: RecordId,
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    pub body: String,
    pub received_at: i64,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub replied: bool,
    #[serde(default)]
    pub deleted_at: Option<i64>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    Sent,
    Failed,
}

impl SendStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SendStatus::Sent => "sent",
            SendStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(SendStatus::Sent),
            "failed" => Some(SendStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentRecord {
    /// Local row id. The provider's id is kept apart; it is absent for
    /// failed attempts and not guaranteed unique.
    pub id: RecordId,
    #[serde(default)]
    pub provider_id: Option<String>,
    pub recipient: String,
    pub subject: String,
    /// HTML as handed to the provider.
    pub body: String,
    pub status: SendStatus,
    pub sent_at: i64,
    pub deleted_at: Option<i64>,
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub id: RecordId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Snapshot of the three source collections, in collection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub messages: Vec<InboundMessage>,
    pub sent: Vec<SentRecord>,
    pub drafts: Vec<DraftRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_filename_from_local_path_and_url() {
        let a = AttachmentRef::from_path(" /home/me/cv.pdf ");
        assert_eq!(a.filename, "cv.pdf");
        assert_eq!(a.path, "/home/me/cv.pdf");
        assert!(!a.is_remote());

        let b = AttachmentRef::from_path("https://example.org/files/paper.pdf");
        assert_eq!(b.filename, "paper.pdf");
        assert!(b.is_remote());
    }

    #[test]
    fn inbound_message_defaults_missing_flags() {
        let json = r#"{
            "id": "m1",
            "sender_name": "Ada",
            "sender_email": "ada@example.org",
            "subject": "Hello",
            "body": "Hi there",
            "received_at": 1700000000
        }"#;
        let m: InboundMessage = serde_json::from_str(json).unwrap();
        assert!(!m.read);
        assert!(!m.replied);
        assert_eq!(m.deleted_at, None);
        assert!(m.attachments.is_empty());
    }

    #[test]
    fn send_status_round_trips_through_str() {
        assert_eq!(SendStatus::parse(SendStatus::Failed.as_str()), Some(SendStatus::Failed));
        assert_eq!(SendStatus::parse("queued"), None);
    }
}
