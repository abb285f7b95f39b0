//! The unified mailbox view-model: folders, search, ordering, selection,
//! batch actions and the composer, independent of any UI toolkit.

pub mod composer;
pub mod effect;
pub mod folder;
pub mod query;
pub mod state;

pub use effect::{Completion, Effect, SendRequest};
pub use folder::Folder;
pub use state::{Mailbox, Notice, View};
