use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

use crate::domain::item::{ItemKey, SourceType};
use crate::domain::records::{
    AttachmentRef, DraftRecord, InboundMessage, SendStatus, SentRecord,
};
use crate::store::repo::MailboxRepository;

pub struct SqliteRepo {
    conn: Connection,
}

impl SqliteRepo {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.migrate()?;
        Ok(repo)
    }

    pub fn open_in_memory() -> Result<Self> {
        let repo = Self {
            conn: Connection::open_in_memory()?,
        };
        repo.migrate()?;
        Ok(repo)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS messages (
                id            TEXT PRIMARY KEY,
                sender_name   TEXT NOT NULL,
                sender_email  TEXT NOT NULL,
                subject       TEXT NOT NULL,
                body          TEXT NOT NULL,
                received_at   INTEGER NOT NULL,
                is_read       INTEGER NOT NULL DEFAULT 0,
                replied       INTEGER NOT NULL DEFAULT 0,
                deleted_at    INTEGER,
                attachments   TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS sent_emails (
                id            TEXT PRIMARY KEY,
                provider_id   TEXT,
                recipient     TEXT NOT NULL,
                subject       TEXT NOT NULL,
                body          TEXT NOT NULL,
                status        TEXT NOT NULL,
                sent_at       INTEGER NOT NULL,
                deleted_at    INTEGER,
                attachments   TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS drafts (
                id            TEXT PRIMARY KEY,
                recipient     TEXT NOT NULL,
                subject       TEXT NOT NULL,
                body          TEXT NOT NULL,
                updated_at    INTEGER NOT NULL,
                deleted_at    INTEGER
            );
            "#,
        )?;
        Ok(())
    }

    /// Run a single-row update and fail when nothing matched.
    fn update_one(&self, what: &str, id: &str, sql: &str, p: impl rusqlite::Params) -> Result<()> {
        let n = self.conn.execute(sql, p)?;
        if n == 0 {
            return Err(anyhow!("no {what} with id {id}"));
        }
        Ok(())
    }
}

fn table(source: SourceType) -> &'static str {
    match source {
        SourceType::Message => "messages",
        SourceType::Sent => "sent_emails",
        SourceType::Draft => "drafts",
    }
}

fn attachments_to_json(items: &[AttachmentRef]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

fn attachments_from_json(raw: &str) -> Vec<AttachmentRef> {
    match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("ignoring malformed attachment list: {e}");
            vec![]
        }
    }
}

fn message_from_row(r: &Row<'_>) -> rusqlite::Result<InboundMessage> {
    let attachments: String = r.get(9)?;
    Ok(InboundMessage {
        id: r.get(0)?,
        sender_name: r.get(1)?,
        sender_email: r.get(2)?,
        subject: r.get(3)?,
        body: r.get(4)?,
        received_at: r.get(5)?,
        read: r.get(6)?,
        replied: r.get(7)?,
        deleted_at: r.get(8)?,
        attachments: attachments_from_json(&attachments),
    })
}

fn sent_from_row(r: &Row<'_>) -> rusqlite::Result<SentRecord> {
    let status: String = r.get(5)?;
    let attachments: String = r.get(8)?;
    Ok(SentRecord {
        id: r.get(0)?,
        provider_id: r.get(1)?,
        recipient: r.get(2)?,
        subject: r.get(3)?,
        body: r.get(4)?,
        status: SendStatus::parse(&status).unwrap_or(SendStatus::Failed),
        sent_at: r.get(6)?,
        deleted_at: r.get(7)?,
        attachments: attachments_from_json(&attachments),
    })
}

fn draft_from_row(r: &Row<'_>) -> rusqlite::Result<DraftRecord> {
    Ok(DraftRecord {
        id: r.get(0)?,
        recipient: r.get(1)?,
        subject: r.get(2)?,
        body: r.get(3)?,
        updated_at: r.get(4)?,
        deleted_at: r.get(5)?,
    })
}

impl MailboxRepository for SqliteRepo {
    fn list_inbound_messages(&self) -> Result<Vec<InboundMessage>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, sender_name, sender_email, subject, body, received_at,
                   is_read, replied, deleted_at, attachments
            FROM messages
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map([], message_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_sent_records(&self) -> Result<Vec<SentRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, provider_id, recipient, subject, body, status, sent_at,
                   deleted_at, attachments
            FROM sent_emails
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map([], sent_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_drafts(&self) -> Result<Vec<DraftRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, recipient, subject, body, updated_at, deleted_at
            FROM drafts
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map([], draft_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn mark_read(&self, id: &str) -> Result<()> {
        self.update_one(
            "message",
            id,
            "UPDATE messages SET is_read=1 WHERE id=?1",
            params![id],
        )
    }

    fn mark_unread(&self, id: &str) -> Result<()> {
        self.update_one(
            "message",
            id,
            "UPDATE messages SET is_read=0 WHERE id=?1",
            params![id],
        )
    }

    fn mark_replied(&self, id: &str) -> Result<()> {
        self.update_one(
            "message",
            id,
            "UPDATE messages SET replied=1 WHERE id=?1",
            params![id],
        )
    }

    fn save_draft(&self, draft: &DraftRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO drafts (id, recipient, subject, body, updated_at, deleted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
              recipient=excluded.recipient,
              subject=excluded.subject,
              body=excluded.body,
              updated_at=excluded.updated_at,
              deleted_at=excluded.deleted_at
            "#,
            params![
                draft.id,
                draft.recipient,
                draft.subject,
                draft.body,
                draft.updated_at,
                draft.deleted_at
            ],
        )?;
        Ok(())
    }

    fn delete_draft_permanently(&self, id: &str) -> Result<()> {
        self.delete_permanently(&ItemKey::draft(id))
    }

    fn move_to_trash(&self, key: &ItemKey, at: i64) -> Result<()> {
        let sql = format!("UPDATE {} SET deleted_at=?1 WHERE id=?2", table(key.source));
        self.update_one(key.source.label(), &key.id, &sql, params![at, key.id])
    }

    fn restore_from_trash(&self, key: &ItemKey) -> Result<()> {
        let sql = format!("UPDATE {} SET deleted_at=NULL WHERE id=?1", table(key.source));
        self.update_one(key.source.label(), &key.id, &sql, params![key.id])
    }

    fn delete_permanently(&self, key: &ItemKey) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id=?1", table(key.source));
        self.update_one(key.source.label(), &key.id, &sql, params![key.id])
    }

    fn record_sent(&self, record: &SentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sent_emails
              (id, provider_id, recipient, subject, body, status, sent_at,
               deleted_at, attachments)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.provider_id,
                record.recipient,
                record.subject,
                record.body,
                record.status.as_str(),
                record.sent_at,
                record.deleted_at,
                attachments_to_json(&record.attachments)?
            ],
        )?;
        Ok(())
    }

    fn upsert_inbound_messages(&self, items: &[InboundMessage]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO messages
                  (id, sender_name, sender_email, subject, body, received_at,
                   is_read, replied, deleted_at, attachments)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(id) DO UPDATE SET
                  sender_name=excluded.sender_name,
                  sender_email=excluded.sender_email,
                  subject=excluded.subject,
                  body=excluded.body,
                  received_at=excluded.received_at,
                  attachments=excluded.attachments
                "#,
            )?;

            for m in items {
                stmt.execute(params![
                    m.id,
                    m.sender_name,
                    m.sender_email,
                    m.subject,
                    m.body,
                    m.received_at,
                    m.read,
                    m.replied,
                    m.deleted_at,
                    attachments_to_json(&m.attachments)?
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
