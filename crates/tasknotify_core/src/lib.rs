//! Task-assignment notification hooks for a wiki host: watches task-page
//! edits for assignee changes, raises notification events, and re-validates
//! them at render time. Host services (user directory, page store,
//! notification queue, watchlist) are consumed through traits.

pub mod config;
pub mod detect;
pub mod diff;
pub mod fixture;
pub mod hooks;
pub mod links;
pub mod notify;
pub mod presentation;
pub mod structure;
pub mod user;
