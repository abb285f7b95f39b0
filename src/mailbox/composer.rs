use crate::domain::now_epoch;
use crate::domain::records::{AttachmentRef, DraftRecord, InboundMessage, RecordId};
use crate::error::MailboxError;
use crate::mailbox::effect::SendRequest;
use crate::send::OutgoingEmail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerField {
    #[default]
    To,
    Subject,
    Body,
    Attachments,
}

impl ComposerField {
    pub fn next(self) -> Self {
        match self {
            Self::To => Self::Subject,
            Self::Subject => Self::Body,
            Self::Body => Self::Attachments,
            Self::Attachments => Self::To,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::To => Self::Attachments,
            Self::Subject => Self::To,
            Self::Body => Self::Subject,
            Self::Attachments => Self::Body,
        }
    }
}

/// An in-progress composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composer {
    /// Bound once the composition has been saved, or when opened from a draft.
    pub draft_id: Option<RecordId>,
    /// The inbound message this answers, if any.
    pub in_reply_to: Option<RecordId>,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<AttachmentRef>,

    pub field: ComposerField,
    /// Path being typed into the attachment field.
    pub attachment_input: String,
    pub sending: bool,
}

impl Composer {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn from_draft(d: &DraftRecord) -> Self {
        Self {
            draft_id: Some(d.id.clone()),
            recipient: d.recipient.clone(),
            subject: d.subject.clone(),
            body: d.body.clone(),
            field: ComposerField::Body,
            ..Self::default()
        }
    }

    pub fn reply_to(m: &InboundMessage) -> Self {
        let subject = if m.subject.starts_with("Re: ") {
            m.subject.clone()
        } else {
            format!("Re: {}", m.subject)
        };
        Self {
            in_reply_to: Some(m.id.clone()),
            recipient: m.sender_email.clone(),
            subject,
            field: ComposerField::Body,
            ..Self::default()
        }
    }

    /// The draft id for this composition, minted on first use.
    pub fn ensure_draft_id(&mut self) -> RecordId {
        self.draft_id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone()
    }

    pub fn to_draft(&mut self) -> DraftRecord {
        DraftRecord {
            id: self.ensure_draft_id(),
            recipient: self.recipient.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            updated_at: now_epoch(),
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), MailboxError> {
        if self.recipient.trim().is_empty() {
            return Err(MailboxError::Validation("recipient is required".into()));
        }
        if self.subject.trim().is_empty() {
            return Err(MailboxError::Validation("subject is required".into()));
        }
        Ok(())
    }

    pub fn to_outgoing(&self) -> Result<OutgoingEmail, MailboxError> {
        self.validate()?;
        Ok(OutgoingEmail {
            recipient: self.recipient.trim().to_string(),
            subject: self.subject.trim().to_string(),
            html: render_html(&self.body),
            text: self.body.clone(),
            attachments: self.attachments.clone(),
        })
    }

    /// Whether `req` is the outstanding send of this composition. Fields are
    /// frozen while sending, so they still match what went out.
    pub fn is_sending(&self, req: &SendRequest) -> bool {
        self.sending
            && self.draft_id == req.draft_id
            && self.in_reply_to == req.in_reply_to
            && self.recipient.trim() == req.email.recipient
            && self.subject.trim() == req.email.subject
            && self.body == req.email.text
    }

    pub fn push_char(&mut self, c: char) {
        match self.field {
            ComposerField::To => self.recipient.push(c),
            ComposerField::Subject => self.subject.push(c),
            ComposerField::Body => self.body.push(c),
            ComposerField::Attachments => self.attachment_input.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.field {
            ComposerField::To => {
                self.recipient.pop();
            }
            ComposerField::Subject => {
                self.subject.pop();
            }
            ComposerField::Body => {
                self.body.pop();
            }
            ComposerField::Attachments => {
                if self.attachment_input.pop().is_none() {
                    self.attachments.pop();
                }
            }
        }
    }

    /// Enter: newline in the body, commit the typed path in the attachment
    /// field, move on from single-line fields.
    pub fn enter(&mut self) {
        match self.field {
            ComposerField::Body => self.body.push('\n'),
            ComposerField::Attachments => {
                let path = std::mem::take(&mut self.attachment_input);
                if !path.trim().is_empty() {
                    self.attachments.push(AttachmentRef::from_path(&path));
                }
            }
            ComposerField::To | ComposerField::Subject => self.field = self.field.next(),
        }
    }
}

/// Escape markup and turn newlines into `<br>`.
pub fn render_html(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' => {}
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
    out
}
