use crate::domain::item::ListItem;
use crate::domain::records::Collections;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Folder {
    #[default]
    Inbox,
    Sent,
    Drafts,
    Trash,
}

impl Folder {
    pub const ALL: [Folder; 4] = [Folder::Inbox, Folder::Sent, Folder::Drafts, Folder::Trash];

    pub fn label(self) -> &'static str {
        match self {
            Folder::Inbox => "Inbox",
            Folder::Sent => "Sent",
            Folder::Drafts => "Drafts",
            Folder::Trash => "Trash",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Folder::Inbox => 0,
            Folder::Sent => 1,
            Folder::Drafts => 2,
            Folder::Trash => 3,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// The four mutually exclusive folders derived from one snapshot.
#[derive(Debug, Default)]
pub struct Partitions<'a> {
    pub inbox: Vec<ListItem<'a>>,
    pub sent: Vec<ListItem<'a>>,
    pub drafts: Vec<ListItem<'a>>,
    /// Soft-deleted records of every type, in message/sent/draft order.
    pub trash: Vec<ListItem<'a>>,
}

impl<'a> Partitions<'a> {
    pub fn folder(&self, folder: Folder) -> &[ListItem<'a>] {
        match folder {
            Folder::Inbox => &self.inbox,
            Folder::Sent => &self.sent,
            Folder::Drafts => &self.drafts,
            Folder::Trash => &self.trash,
        }
    }

    pub fn len(&self, folder: Folder) -> usize {
        self.folder(folder).len()
    }

    pub fn unread_inbox(&self) -> usize {
        self.inbox.iter().filter(|i| !i.read).count()
    }
}

pub fn partition(c: &Collections) -> Partitions<'_> {
    let mut p = Partitions::default();

    for m in &c.messages {
        let item = ListItem::from_message(m);
        if m.deleted_at.is_some() {
            p.trash.push(item);
        } else {
            p.inbox.push(item);
        }
    }
    for s in &c.sent {
        let item = ListItem::from_sent(s);
        if s.deleted_at.is_some() {
            p.trash.push(item);
        } else {
            p.sent.push(item);
        }
    }
    for d in &c.drafts {
        let item = ListItem::from_draft(d);
        if d.deleted_at.is_some() {
            p.trash.push(item);
        } else {
            p.drafts.push(item);
        }
    }

    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{ItemKey, SourceType};
    use crate::domain::records::{DraftRecord, InboundMessage, SendStatus, SentRecord};

    fn message(id: &str, deleted: bool) -> InboundMessage {
        InboundMessage {
            id: id.into(),
            sender_name: "Sender".into(),
            sender_email: "sender@example.org".into(),
            subject: format!("subject {id}"),
            body: String::new(),
            received_at: 10,
            read: false,
            replied: false,
            deleted_at: deleted.then_some(99),
            attachments: vec![],
        }
    }

    fn sent(id: &str, deleted: bool) -> SentRecord {
        SentRecord {
            id: id.into(),
            provider_id: None,
            recipient: "to@example.org".into(),
            subject: "re".into(),
            body: String::new(),
            status: SendStatus::Sent,
            sent_at: 20,
            deleted_at: deleted.then_some(99),
            attachments: vec![],
        }
    }

    fn draft(id: &str, deleted: bool) -> DraftRecord {
        DraftRecord {
            id: id.into(),
            recipient: String::new(),
            subject: String::new(),
            body: String::new(),
            updated_at: 30,
            deleted_at: deleted.then_some(99),
        }
    }

    #[test]
    fn every_record_lands_in_exactly_one_folder() {
        // Ids deliberately collide across source types.
        let c = Collections {
            messages: vec![message("1", false), message("2", true), message("3", false)],
            sent: vec![sent("1", false), sent("2", true)],
            drafts: vec![draft("1", true), draft("2", false)],
        };
        let p = partition(&c);

        assert_eq!(p.len(Folder::Inbox), 2);
        assert_eq!(p.len(Folder::Sent), 1);
        assert_eq!(p.len(Folder::Drafts), 1);
        assert_eq!(p.len(Folder::Trash), 3);

        let total: usize = Folder::ALL.iter().map(|f| p.len(*f)).sum();
        assert_eq!(total, c.messages.len() + c.sent.len() + c.drafts.len());

        let mut keys: Vec<ItemKey> = Folder::ALL
            .iter()
            .flat_map(|f| p.folder(*f).iter().map(|i| i.key.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);

        for item in p.folder(Folder::Trash) {
            assert!(item.record.deleted_at().is_some());
        }
        let trash_sources: Vec<SourceType> =
            p.trash.iter().map(|i| i.key.source).collect();
        assert_eq!(
            trash_sources,
            vec![SourceType::Message, SourceType::Sent, SourceType::Draft]
        );
    }

    #[test]
    fn partition_leaves_input_untouched() {
        let c = Collections {
            messages: vec![message("1", false)],
            sent: vec![],
            drafts: vec![draft("d", true)],
        };
        let before = c.clone();
        let _ = partition(&c);
        assert_eq!(c, before);
    }

    #[test]
    fn unread_count_only_counts_live_messages() {
        let mut read = message("r", false);
        read.read = true;
        let c = Collections {
            messages: vec![read, message("u", false), message("t", true)],
            ..Default::default()
        };
        assert_eq!(partition(&c).unread_inbox(), 1);
    }

    #[test]
    fn folder_cycle_wraps() {
        assert_eq!(Folder::Trash.next(), Folder::Inbox);
        assert_eq!(Folder::Inbox.prev(), Folder::Trash);
        assert_eq!(Folder::Sent.next(), Folder::Drafts);
    }
}
