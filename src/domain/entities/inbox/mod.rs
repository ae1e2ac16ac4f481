//! Inbox Entity Module

pub mod inbox_entry;

pub use inbox_entry::InboxEntry;
