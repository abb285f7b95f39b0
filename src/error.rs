use thiserror::Error;

/// Failures the mailbox surfaces to the user. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// Missing recipient or subject; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// A store operation reported failure.
    #[error("{action} failed: {reason}")]
    Mutation { action: &'static str, reason: String },

    /// The send API returned a non-success envelope or could not be reached.
    #[error("send failed: {0}")]
    Provider(String),
}

impl MailboxError {
    pub fn mutation(action: &'static str, err: impl std::fmt::Display) -> Self {
        MailboxError::Mutation {
            action,
            reason: err.to_string(),
        }
    }
}
