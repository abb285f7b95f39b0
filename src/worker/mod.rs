use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use anyhow::Result;

use crate::domain::now_epoch;
use crate::domain::records::{SendStatus, SentRecord};
use crate::error::MailboxError;
use crate::mailbox::effect::{Completion, Effect, SendRequest};
use crate::send::EmailSender;
use crate::store::repo::MailboxRepository;

/// Runs effects on a background thread so the UI never waits on the
/// store or the send API.
pub struct Worker {
    tx: Option<Sender<Effect>>,
    rx: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(repo: Box<dyn MailboxRepository>, sender: Box<dyn EmailSender>) -> Self {
        let (effect_tx, effect_rx) = mpsc::channel::<Effect>();
        let (done_tx, done_rx) = mpsc::channel::<Completion>();

        let handle = thread::spawn(move || {
            for effect in effect_rx {
                log::debug!("running {}", effect.action());
                let completion = execute(repo.as_ref(), sender.as_ref(), effect);
                if done_tx.send(completion).is_err() {
                    break;
                }
            }
        });

        Self {
            tx: Some(effect_tx),
            rx: done_rx,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, effect: Effect) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("worker already stopped"))?;
        tx.send(effect)
            .map_err(|_| anyhow::anyhow!("worker thread is gone"))?;
        Ok(())
    }

    pub fn submit_all(&self, effects: impl IntoIterator<Item = Effect>) -> Result<()> {
        for e in effects {
            self.submit(e)?;
        }
        Ok(())
    }

    /// Completions that have arrived since the last call; never blocks.
    pub fn drain(&self) -> Vec<Completion> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(c) => out.push(c),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Block for the next completion.
    pub fn recv(&self) -> Option<Completion> {
        self.rx.recv().ok()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once queued effects finish.
        self.tx.take();
        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                log::error!("worker thread panicked");
            }
        }
    }
}

/// Run one effect against the collaborators.
pub fn execute(
    repo: &dyn MailboxRepository,
    sender: &dyn EmailSender,
    effect: Effect,
) -> Completion {
    match effect {
        Effect::Reload => match repo.load_all() {
            Ok(data) => Completion::Loaded(data),
            Err(e) => failed(Effect::Reload, e),
        },
        Effect::RefreshSent => match repo.refresh_sent_records() {
            Ok(sent) => Completion::SentRefreshed(sent),
            Err(e) => failed(Effect::RefreshSent, e),
        },
        Effect::Send(req) => deliver(repo, sender, req),
        other => mutate(repo, other),
    }
}

fn mutate(repo: &dyn MailboxRepository, effect: Effect) -> Completion {
    let result = match &effect {
        Effect::MarkRead(id) => repo.mark_read(id),
        Effect::MarkUnread(id) => repo.mark_unread(id),
        Effect::MarkReplied(id) => repo.mark_replied(id),
        Effect::MoveToTrash(key) => repo.move_to_trash(key, now_epoch()),
        Effect::Restore(key) => repo.restore_from_trash(key),
        Effect::DeletePermanently(key) => repo.delete_permanently(key),
        Effect::SaveDraft(d) => repo.save_draft(d),
        Effect::DeleteDraft(id) => repo.delete_draft_permanently(id),
        Effect::Reload | Effect::RefreshSent | Effect::Send(_) => Ok(()),
    };

    match result {
        Ok(()) => Completion::Done(effect),
        Err(e) => failed(effect, e),
    }
}

fn failed(effect: Effect, err: anyhow::Error) -> Completion {
    let error = MailboxError::mutation(effect.action(), err);
    Completion::Failed { effect, error }
}

/// Hand the message to the provider and log the attempt as a sent record.
fn deliver(
    repo: &dyn MailboxRepository,
    sender: &dyn EmailSender,
    req: SendRequest,
) -> Completion {
    let outcome = sender.send(&req.email);

    let (provider_id, status) = match &outcome {
        Ok(id) if !id.is_empty() => (Some(id.clone()), SendStatus::Sent),
        Ok(_) => (None, SendStatus::Sent),
        Err(_) => (None, SendStatus::Failed),
    };
    let record = SentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        provider_id,
        recipient: req.email.recipient.clone(),
        subject: req.email.subject.clone(),
        body: req.email.html.clone(),
        status,
        sent_at: now_epoch(),
        deleted_at: None,
        attachments: req.email.attachments.clone(),
    };
    let recorded = repo.record_sent(&record);

    match outcome {
        Ok(_) => {
            log::info!("delivered email to {}", req.email.recipient);
            Completion::Delivered {
                request: req,
                unrecorded: recorded
                    .err()
                    .map(|e| MailboxError::mutation("record sent email", e)),
            }
        }
        Err(error) => {
            // The provider error is what the user sees; the lost row is logged.
            if let Err(e) = recorded {
                log::warn!("could not record failed send to {}: {e}", record.recipient);
            }
            Completion::Failed {
                effect: Effect::Send(req),
                error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::ItemKey;
    use crate::domain::records::DraftRecord;
    use crate::send::OutgoingEmail;
    use crate::store::sqlite::SqliteRepo;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct ScriptedSender {
        fail_with: Option<String>,
        sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    }

    impl EmailSender for ScriptedSender {
        fn send(&self, email: &OutgoingEmail) -> Result<String, MailboxError> {
            self.sent.lock().unwrap().push(email.clone());
            match &self.fail_with {
                Some(msg) => Err(MailboxError::Provider(msg.clone())),
                None => Ok(format!("prov-{}", self.sent.lock().unwrap().len())),
            }
        }
    }

    fn request() -> SendRequest {
        SendRequest {
            email: OutgoingEmail {
                recipient: "reader@example.org".into(),
                subject: "Newsletter".into(),
                html: "Hello<br>world".into(),
                text: "Hello\nworld".into(),
                attachments: vec![],
            },
            draft_id: Some("d1".into()),
            in_reply_to: None,
        }
    }

    #[test]
    fn successful_send_records_sent_row() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let sender = ScriptedSender::default();

        let c = execute(&repo, &sender, Effect::Send(request()));
        assert_eq!(
            c,
            Completion::Delivered {
                request: request(),
                unrecorded: None,
            }
        );

        let sent = repo.list_sent_records().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].provider_id.as_deref(), Some("prov-1"));
        assert_eq!(sent[0].status, SendStatus::Sent);
        assert_eq!(sent[0].body, "Hello<br>world");
    }

    #[test]
    fn provider_failure_is_surfaced_and_logged_as_failed() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let sender = ScriptedSender {
            fail_with: Some("domain is not verified".into()),
            ..Default::default()
        };

        let c = execute(&repo, &sender, Effect::Send(request()));
        assert_eq!(
            c,
            Completion::Failed {
                effect: Effect::Send(request()),
                error: MailboxError::Provider("domain is not verified".into()),
            }
        );
        assert_eq!(repo.list_sent_records().unwrap()[0].status, SendStatus::Failed);
    }

    struct FixedIdSender;

    impl EmailSender for FixedIdSender {
        fn send(&self, _email: &OutgoingEmail) -> Result<String, MailboxError> {
            Ok("same-id".into())
        }
    }

    #[test]
    fn repeated_provider_id_keeps_every_sent_row() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        for _ in 0..2 {
            let c = execute(&repo, &FixedIdSender, Effect::Send(request()));
            assert!(matches!(c, Completion::Delivered { unrecorded: None, .. }));
        }
        let sent = repo.list_sent_records().unwrap();
        assert_eq!(sent.len(), 2);
        assert_ne!(sent[0].id, sent[1].id);
        assert!(sent.iter().all(|s| s.provider_id.as_deref() == Some("same-id")));
    }

    #[test]
    fn unwritable_sent_row_is_reported_with_the_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.db");
        let repo = SqliteRepo::open(&path).unwrap();
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE sent_emails;")
            .unwrap();

        match execute(&repo, &ScriptedSender::default(), Effect::Send(request())) {
            Completion::Delivered {
                request: req,
                unrecorded: Some(MailboxError::Mutation { action, .. }),
            } => {
                assert_eq!(req, request());
                assert_eq!(action, "record sent email");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn store_errors_become_mutation_failures() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let sender = ScriptedSender::default();
        let c = execute(&repo, &sender, Effect::MoveToTrash(ItemKey::message("nope")));
        match c {
            Completion::Failed {
                error: MailboxError::Mutation { action, reason },
                ..
            } => {
                assert_eq!(action, "move to trash");
                assert!(reason.contains("nope"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn worker_thread_runs_effects_in_order() {
        let repo = SqliteRepo::open_in_memory().unwrap();
        let worker = Worker::spawn(Box::new(repo), Box::new(ScriptedSender::default()));

        let draft = DraftRecord {
            id: "d1".into(),
            recipient: String::new(),
            subject: String::new(),
            body: "x".into(),
            updated_at: 1,
            deleted_at: None,
        };
        worker
            .submit_all([Effect::SaveDraft(draft.clone()), Effect::Reload])
            .unwrap();

        assert_eq!(worker.recv(), Some(Completion::Done(Effect::SaveDraft(draft.clone()))));
        match worker.recv() {
            Some(Completion::Loaded(data)) => assert_eq!(data.drafts, vec![draft]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(worker.drain().is_empty());
    }
}
