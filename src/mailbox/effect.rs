use crate::domain::item::ItemKey;
use crate::domain::records::{Collections, DraftRecord, RecordId, SentRecord};
use crate::error::MailboxError;
use crate::send::OutgoingEmail;

/// A request the view-model hands to the collaborators. It never performs
/// these itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Reload,
    RefreshSent,
    MarkRead(RecordId),
    MarkUnread(RecordId),
    MarkReplied(RecordId),
    MoveToTrash(ItemKey),
    Restore(ItemKey),
    DeletePermanently(ItemKey),
    SaveDraft(DraftRecord),
    DeleteDraft(RecordId),
    Send(SendRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub email: OutgoingEmail,
    pub draft_id: Option<RecordId>,
    pub in_reply_to: Option<RecordId>,
}

impl Effect {
    /// The item this effect mutates, if it targets a single one.
    pub fn key(&self) -> Option<ItemKey> {
        match self {
            Effect::MarkRead(id) | Effect::MarkUnread(id) | Effect::MarkReplied(id) => {
                Some(ItemKey::message(id.as_str()))
            }
            Effect::MoveToTrash(k) | Effect::Restore(k) | Effect::DeletePermanently(k) => {
                Some(k.clone())
            }
            Effect::SaveDraft(d) => Some(ItemKey::draft(d.id.as_str())),
            Effect::DeleteDraft(id) => Some(ItemKey::draft(id.as_str())),
            Effect::Reload | Effect::RefreshSent | Effect::Send(_) => None,
        }
    }

    /// Mutations the in-flight guard tracks. Follow-ups such as
    /// `MarkReplied` or `DeleteDraft` share item keys but never hold the guard.
    pub fn is_guarded(&self) -> bool {
        matches!(
            self,
            Effect::MarkRead(_)
                | Effect::MarkUnread(_)
                | Effect::MoveToTrash(_)
                | Effect::Restore(_)
                | Effect::DeletePermanently(_)
        )
    }

    pub fn action(&self) -> &'static str {
        match self {
            Effect::Reload => "reload",
            Effect::RefreshSent => "refresh sent",
            Effect::MarkRead(_) => "mark read",
            Effect::MarkUnread(_) => "mark unread",
            Effect::MarkReplied(_) => "mark replied",
            Effect::MoveToTrash(_) => "move to trash",
            Effect::Restore(_) => "restore",
            Effect::DeletePermanently(_) => "delete",
            Effect::SaveDraft(_) => "save draft",
            Effect::DeleteDraft(_) => "delete draft",
            Effect::Send(_) => "send",
        }
    }
}

/// Outcome of an [`Effect`], fed back into the view-model.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Loaded(Collections),
    SentRefreshed(Vec<SentRecord>),
    /// A mutation succeeded.
    Done(Effect),
    /// The provider accepted the message. `unrecorded` is set when the sent
    /// row could not be written.
    Delivered {
        request: SendRequest,
        unrecorded: Option<MailboxError>,
    },
    Failed { effect: Effect, error: MailboxError },
}
