use std::fmt;

use crate::domain::format_epoch;
use crate::domain::records::{DraftRecord, InboundMessage, RecordId, SendStatus, SentRecord};

/// Which source collection a list item was projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceType {
    Message,
    Sent,
    Draft,
}

impl SourceType {
    pub fn label(self) -> &'static str {
        match self {
            SourceType::Message => "message",
            SourceType::Sent => "sent",
            SourceType::Draft => "draft",
        }
    }
}

/// Ids are only unique per source type, so everything that mutates or
/// tracks an item goes through this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub source: SourceType,
    pub id: RecordId,
}

impl ItemKey {
    pub fn new(source: SourceType, id: impl Into<RecordId>) -> Self {
        Self {
            source,
            id: id.into(),
        }
    }

    pub fn message(id: impl Into<RecordId>) -> Self {
        Self::new(SourceType::Message, id)
    }

    pub fn sent(id: impl Into<RecordId>) -> Self {
        Self::new(SourceType::Sent, id)
    }

    pub fn draft(id: impl Into<RecordId>) -> Self {
        Self::new(SourceType::Draft, id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.label(), self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordRef<'a> {
    Message(&'a InboundMessage),
    Sent(&'a SentRecord),
    Draft(&'a DraftRecord),
}

impl RecordRef<'_> {
    pub fn deleted_at(&self) -> Option<i64> {
        match self {
            RecordRef::Message(m) => m.deleted_at,
            RecordRef::Sent(s) => s.deleted_at,
            RecordRef::Draft(d) => d.deleted_at,
        }
    }
}

/// Normalized row shared by every folder.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem<'a> {
    pub key: ItemKey,
    pub title: String,
    pub subtitle: String,
    pub display_date: String,
    pub read: bool,
    pub replied: bool,
    pub status: Option<SendStatus>,
    pub sort_timestamp: i64,
    pub record: RecordRef<'a>,
}

impl<'a> ListItem<'a> {
    pub fn from_message(m: &'a InboundMessage) -> Self {
        let title = if m.sender_name.trim().is_empty() {
            m.sender_email.clone()
        } else {
            m.sender_name.clone()
        };
        Self {
            key: ItemKey::message(m.id.as_str()),
            title,
            subtitle: m.subject.clone(),
            display_date: format_epoch(m.received_at),
            read: m.read,
            replied: m.replied,
            status: None,
            sort_timestamp: m.received_at,
            record: RecordRef::Message(m),
        }
    }

    pub fn from_sent(s: &'a SentRecord) -> Self {
        Self {
            key: ItemKey::sent(s.id.as_str()),
            title: format!("To: {}", s.recipient),
            subtitle: s.subject.clone(),
            display_date: format_epoch(s.sent_at),
            read: true,
            replied: false,
            status: Some(s.status),
            sort_timestamp: s.sent_at,
            record: RecordRef::Sent(s),
        }
    }

    pub fn from_draft(d: &'a DraftRecord) -> Self {
        let title = if d.recipient.trim().is_empty() {
            String::from("(no recipient)")
        } else {
            format!("To: {}", d.recipient)
        };
        let subtitle = if d.subject.trim().is_empty() {
            String::from("(no subject)")
        } else {
            d.subject.clone()
        };
        Self {
            key: ItemKey::draft(d.id.as_str()),
            title,
            subtitle,
            display_date: format_epoch(d.updated_at),
            read: true,
            replied: false,
            status: None,
            sort_timestamp: d.updated_at,
            record: RecordRef::Draft(d),
        }
    }

    /// Raw fields the search box looks at.
    pub fn search_fields(&self) -> Vec<&'a str> {
        match self.record {
            RecordRef::Message(m) => vec![
                m.sender_name.as_str(),
                m.sender_email.as_str(),
                m.subject.as_str(),
            ],
            RecordRef::Sent(s) => vec![s.recipient.as_str(), s.subject.as_str()],
            RecordRef::Draft(d) => vec![d.recipient.as_str(), d.subject.as_str()],
        }
    }

    pub fn is_unread_message(&self) -> bool {
        matches!(self.record, RecordRef::Message(m) if !m.read)
    }
}
