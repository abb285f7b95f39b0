pub mod config;
pub mod domain;
pub mod error;
pub mod mailbox;
pub mod secrets;
pub mod send;
pub mod store;
pub mod terminal;
pub mod worker;
