use anyhow::Result;

use crate::domain::item::ItemKey;
use crate::domain::records::{Collections, DraftRecord, InboundMessage, SentRecord};

/// Data-access contract behind the mailbox. Updates that match no row are errors.
pub trait MailboxRepository: Send {
    fn list_inbound_messages(&self) -> Result<Vec<InboundMessage>>;
    fn list_sent_records(&self) -> Result<Vec<SentRecord>>;
    fn list_drafts(&self) -> Result<Vec<DraftRecord>>;

    fn mark_read(&self, id: &str) -> Result<()>;
    fn mark_unread(&self, id: &str) -> Result<()>;
    fn mark_replied(&self, id: &str) -> Result<()>;

    fn save_draft(&self, draft: &DraftRecord) -> Result<()>;
    fn delete_draft_permanently(&self, id: &str) -> Result<()>;

    fn move_to_trash(&self, key: &ItemKey, at: i64) -> Result<()>;
    fn restore_from_trash(&self, key: &ItemKey) -> Result<()>;
    fn delete_permanently(&self, key: &ItemKey) -> Result<()>;

    fn record_sent(&self, record: &SentRecord) -> Result<()>;
    fn upsert_inbound_messages(&self, items: &[InboundMessage]) -> Result<()>;

    /// Re-read the sent collection after a delivery.
    fn refresh_sent_records(&self) -> Result<Vec<SentRecord>> {
        self.list_sent_records()
    }

    fn load_all(&self) -> Result<Collections> {
        Ok(Collections {
            messages: self.list_inbound_messages()?,
            sent: self.list_sent_records()?,
            drafts: self.list_drafts()?,
        })
    }
}
