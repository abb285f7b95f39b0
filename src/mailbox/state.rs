use std::collections::BTreeSet;

use crate::domain::item::{ItemKey, ListItem, RecordRef, SourceType};
use crate::domain::now_epoch;
use crate::domain::records::Collections;
use crate::error::MailboxError;
use crate::mailbox::composer::Composer;
use crate::mailbox::effect::{Completion, Effect, SendRequest};
use crate::mailbox::folder::{Folder, Partitions, partition};
use crate::mailbox::query::filter_and_sort;

/// Master-detail state. Selection and composing are exclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
    #[default]
    NoSelection,
    Selected(ItemKey),
    Composing(Composer),
}

/// Transient message shown in the status line.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(MailboxError),
}

/// Unified view over messages, sent records and drafts.
///
/// Holds a snapshot of the three collections and derives the folder
/// partitions, search filter and sort order from it on every read. Actions
/// return [`Effect`]s for the caller to run; outcomes come back through
/// [`Mailbox::apply`].
#[derive(Debug, Default)]
pub struct Mailbox {
    data: Collections,
    folder: Folder,
    query: String,
    view: View,
    /// List position. Follows `select` even when a draft opens the
    /// composer, so navigation and single-item batches keep working there.
    cursor: Option<ItemKey>,
    checked: BTreeSet<ItemKey>,
    in_flight: BTreeSet<ItemKey>,
    notice: Option<Notice>,
}

impl Mailbox {
    pub fn new(data: Collections) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    // ----- Reads -----

    pub fn data(&self) -> &Collections {
        &self.data
    }

    pub fn folder(&self) -> Folder {
        self.folder
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn cursor(&self) -> Option<&ItemKey> {
        self.cursor.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn checked(&self) -> &BTreeSet<ItemKey> {
        &self.checked
    }

    pub fn is_checked(&self, key: &ItemKey) -> bool {
        self.checked.contains(key)
    }

    pub fn is_in_flight(&self, key: &ItemKey) -> bool {
        self.in_flight.contains(key)
    }

    pub fn partitions(&self) -> Partitions<'_> {
        partition(&self.data)
    }

    /// The active folder, filtered by the query and sorted newest first.
    pub fn visible(&self) -> Vec<ListItem<'_>> {
        let p = partition(&self.data);
        filter_and_sort(p.folder(self.folder), &self.query)
    }

    pub fn selected_key(&self) -> Option<&ItemKey> {
        match &self.view {
            View::Selected(k) => Some(k),
            _ => None,
        }
    }

    pub fn selected_item(&self) -> Option<ListItem<'_>> {
        let key = self.selected_key()?;
        self.find_in_folder(key)
    }

    pub fn composer(&self) -> Option<&Composer> {
        match &self.view {
            View::Composing(c) => Some(c),
            _ => None,
        }
    }

    pub fn composer_mut(&mut self) -> Option<&mut Composer> {
        match &mut self.view {
            View::Composing(c) => Some(c),
            _ => None,
        }
    }

    fn find_in_folder(&self, key: &ItemKey) -> Option<ListItem<'_>> {
        partition(&self.data)
            .folder(self.folder)
            .iter()
            .find(|i| &i.key == key)
            .cloned()
    }

    // ----- Folder and search -----

    pub fn set_folder(&mut self, folder: Folder) {
        if folder == self.folder {
            return;
        }
        self.folder = folder;
        self.checked.clear();
        self.cursor = None;
        if !matches!(self.view, View::Composing(_)) {
            self.view = View::NoSelection;
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ----- Selection -----

    pub fn select(&mut self, key: &ItemKey) -> Vec<Effect> {
        let (draft, unread) = match self.find_in_folder(key) {
            None => return vec![],
            Some(item) => {
                let draft = match item.record {
                    RecordRef::Draft(d) if self.folder == Folder::Drafts => {
                        Some(Composer::from_draft(d))
                    }
                    _ => None,
                };
                (draft, item.is_unread_message())
            }
        };

        self.cursor = Some(key.clone());
        if let Some(composer) = draft {
            self.view = View::Composing(composer);
            return vec![];
        }

        self.view = View::Selected(key.clone());
        if unread && self.folder != Folder::Trash {
            self.track(Effect::MarkRead(key.id.clone()))
                .into_iter()
                .collect()
        } else {
            vec![]
        }
    }

    /// Move the selection within the visible list. Stops at either end;
    /// moving down with nothing selected picks the first item.
    pub fn move_cursor(&mut self, delta: isize) -> Vec<Effect> {
        let keys: Vec<ItemKey> = self.visible().into_iter().map(|i| i.key).collect();
        if keys.is_empty() {
            return vec![];
        }
        let current = self
            .cursor
            .as_ref()
            .and_then(|k| keys.iter().position(|x| x == k));
        let next = match current {
            None if delta > 0 => 0,
            None => return vec![],
            Some(pos) => {
                let n = pos as isize + delta;
                if n < 0 || n >= keys.len() as isize {
                    return vec![];
                }
                n as usize
            }
        };
        self.select(&keys[next])
    }

    pub fn clear_selection(&mut self) {
        self.cursor = None;
        if let View::Selected(_) = self.view {
            self.view = View::NoSelection;
        }
    }

    // ----- Composer -----

    pub fn compose(&mut self, composer: Composer) {
        self.view = View::Composing(composer);
    }

    pub fn compose_blank(&mut self) {
        self.compose(Composer::blank());
    }

    /// Open a reply to the selected inbound message. Returns whether it did.
    pub fn reply(&mut self) -> bool {
        let Some(key) = self.selected_key() else {
            return false;
        };
        if key.source != SourceType::Message {
            return false;
        }
        let Some(msg) = self.data.messages.iter().find(|m| m.id == key.id) else {
            return false;
        };
        let composer = Composer::reply_to(msg);
        self.compose(composer);
        true
    }

    pub fn close_composer(&mut self) {
        if let View::Composing(_) = self.view {
            self.view = View::NoSelection;
        }
    }

    /// Persist the composition; the composer stays open.
    pub fn save_draft(&mut self) -> Vec<Effect> {
        let View::Composing(c) = &mut self.view else {
            return vec![];
        };
        vec![Effect::SaveDraft(c.to_draft())]
    }

    pub fn send(&mut self) -> Vec<Effect> {
        let View::Composing(c) = &mut self.view else {
            return vec![];
        };
        if c.sending {
            return vec![];
        }
        match c.to_outgoing() {
            Err(e) => {
                self.notice = Some(Notice::Error(e));
                vec![]
            }
            Ok(email) => {
                c.sending = true;
                let req = SendRequest {
                    email,
                    draft_id: c.draft_id.clone(),
                    in_reply_to: c.in_reply_to.clone(),
                };
                vec![Effect::Send(req)]
            }
        }
    }

    // ----- Checked set and batch actions -----

    pub fn toggle_checked(&mut self, key: &ItemKey) {
        if !self.checked.remove(key) {
            self.checked.insert(key.clone());
        }
    }

    pub fn toggle_checked_selected(&mut self) {
        if let Some(key) = self.cursor.clone() {
            self.toggle_checked(&key);
        }
    }

    pub fn check_all_visible(&mut self) {
        let keys: Vec<ItemKey> = self.visible().into_iter().map(|i| i.key).collect();
        self.checked.extend(keys);
    }

    /// Checked items, or the one under the cursor when nothing is checked.
    fn batch_targets(&self) -> Vec<ItemKey> {
        if !self.checked.is_empty() {
            return self.checked.iter().cloned().collect();
        }
        self.cursor.iter().cloned().collect()
    }

    pub fn mark_read_batch(&mut self) -> Vec<Effect> {
        self.batch(|k| (k.source == SourceType::Message).then(|| Effect::MarkRead(k.id.clone())))
    }

    pub fn mark_unread_batch(&mut self) -> Vec<Effect> {
        self.batch(|k| {
            (k.source == SourceType::Message).then(|| Effect::MarkUnread(k.id.clone()))
        })
    }

    /// Soft delete everywhere except trash, where it erases.
    pub fn delete_batch(&mut self) -> Vec<Effect> {
        let in_trash = self.folder == Folder::Trash;
        self.batch(|k| {
            Some(if in_trash {
                Effect::DeletePermanently(k.clone())
            } else {
                Effect::MoveToTrash(k.clone())
            })
        })
    }

    pub fn restore_batch(&mut self) -> Vec<Effect> {
        if self.folder != Folder::Trash {
            return vec![];
        }
        self.batch(|k| Some(Effect::Restore(k.clone())))
    }

    fn batch(&mut self, f: impl Fn(&ItemKey) -> Option<Effect>) -> Vec<Effect> {
        let targets = self.batch_targets();
        self.checked.clear();
        targets
            .iter()
            .filter_map(|k| f(k))
            .filter_map(|e| self.track(e))
            .collect()
    }

    /// Skip a mutation whose item already has one outstanding.
    fn track(&mut self, effect: Effect) -> Option<Effect> {
        let key = effect.key()?;
        if !self.in_flight.insert(key) {
            log::debug!("skipping {}: item already has a request in flight", effect.action());
            return None;
        }
        Some(effect)
    }

    // ----- Completions -----

    /// Fold a collaborator outcome into the snapshot; returns follow-up effects.
    pub fn apply(&mut self, completion: Completion) -> Vec<Effect> {
        let follow = match completion {
            Completion::Loaded(data) => {
                self.data = data;
                vec![]
            }
            Completion::SentRefreshed(sent) => {
                self.data.sent = sent;
                vec![]
            }
            Completion::Done(effect) => {
                self.release(&effect);
                self.patch(&effect);
                vec![]
            }
            Completion::Delivered {
                request,
                unrecorded,
            } => self.delivered(request, unrecorded),
            Completion::Failed { effect, error } => {
                log::warn!("{} failed: {error}", effect.action());
                self.release(&effect);
                let mut follow = vec![];
                if let Effect::Send(req) = &effect {
                    if let View::Composing(c) = &mut self.view {
                        if c.is_sending(req) {
                            c.sending = false;
                        }
                    }
                    // The failed attempt is logged as a sent record.
                    follow.push(Effect::RefreshSent);
                }
                self.notice = Some(Notice::Error(error));
                follow
            }
        };
        self.reconcile();
        follow
    }

    fn release(&mut self, effect: &Effect) {
        if !effect.is_guarded() {
            return;
        }
        if let Some(k) = effect.key() {
            self.in_flight.remove(&k);
        }
    }

    fn delivered(&mut self, req: SendRequest, unrecorded: Option<MailboxError>) -> Vec<Effect> {
        if let View::Composing(c) = &self.view {
            if c.is_sending(&req) {
                self.view = View::NoSelection;
            }
        }
        self.notice = Some(match unrecorded {
            Some(e) => {
                log::warn!("email to {} sent but not recorded: {e}", req.email.recipient);
                Notice::Error(e)
            }
            None => Notice::Info(format!("Email sent to {}", req.email.recipient)),
        });

        let mut follow = vec![];
        if let Some(id) = req.draft_id {
            follow.push(Effect::DeleteDraft(id));
        }
        if let Some(id) = req.in_reply_to {
            follow.push(Effect::MarkReplied(id));
        }
        follow.push(Effect::RefreshSent);
        follow
    }

    /// Local patch after the store confirmed a mutation.
    fn patch(&mut self, effect: &Effect) {
        let data = &mut self.data;
        match effect {
            Effect::MarkRead(id) => set_message_flag(data, id, |m| m.read = true),
            Effect::MarkUnread(id) => set_message_flag(data, id, |m| m.read = false),
            Effect::MarkReplied(id) => set_message_flag(data, id, |m| m.replied = true),
            Effect::MoveToTrash(k) => {
                set_deleted_at(data, k, Some(now_epoch()));
                self.notice = Some(Notice::Info("Moved to trash".into()));
            }
            Effect::Restore(k) => {
                set_deleted_at(data, k, None);
                self.notice = Some(Notice::Info("Restored".into()));
            }
            Effect::DeletePermanently(k) => {
                remove_record(data, k);
                self.notice = Some(Notice::Info("Deleted permanently".into()));
            }
            Effect::DeleteDraft(id) => remove_record(data, &ItemKey::draft(id.as_str())),
            Effect::SaveDraft(d) => {
                match data.drafts.iter_mut().find(|x| x.id == d.id) {
                    Some(existing) => *existing = d.clone(),
                    None => data.drafts.push(d.clone()),
                }
                self.notice = Some(Notice::Info("Draft saved".into()));
            }
            Effect::Reload | Effect::RefreshSent | Effect::Send(_) => {}
        }
    }

    /// Drop selection and checks that no longer exist in the active folder.
    fn reconcile(&mut self) {
        let present: BTreeSet<ItemKey> = partition(&self.data)
            .folder(self.folder)
            .iter()
            .map(|i| i.key.clone())
            .collect();
        self.checked.retain(|k| present.contains(k));
        if self.cursor.as_ref().is_some_and(|k| !present.contains(k)) {
            self.cursor = None;
        }
        if let View::Selected(k) = &self.view {
            if !present.contains(k) {
                self.view = View::NoSelection;
            }
        }
    }
}

fn set_message_flag(
    data: &mut Collections,
    id: &str,
    f: impl FnOnce(&mut crate::domain::records::InboundMessage),
) {
    if let Some(m) = data.messages.iter_mut().find(|m| m.id == id) {
        f(m);
    }
}

fn set_deleted_at(data: &mut Collections, key: &ItemKey, at: Option<i64>) {
    match key.source {
        SourceType::Message => {
            if let Some(m) = data.messages.iter_mut().find(|m| m.id == key.id) {
                m.deleted_at = at;
            }
        }
        SourceType::Sent => {
            if let Some(s) = data.sent.iter_mut().find(|s| s.id == key.id) {
                s.deleted_at = at;
            }
        }
        SourceType::Draft => {
            if let Some(d) = data.drafts.iter_mut().find(|d| d.id == key.id) {
                d.deleted_at = at;
            }
        }
    }
}

fn remove_record(data: &mut Collections, key: &ItemKey) {
    match key.source {
        SourceType::Message => data.messages.retain(|m| m.id != key.id),
        SourceType::Sent => data.sent.retain(|s| s.id != key.id),
        SourceType::Draft => data.drafts.retain(|d| d.id != key.id),
    }
}
