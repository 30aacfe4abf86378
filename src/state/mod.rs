//! View state for the dashboard pages.
//!
//! DESIGN
//! ======
//! State is split by page (`patients`, `notifications`, `chat`) so each view
//! depends on a small focused model. Everything here is synchronous and
//! network-free; callers apply a change locally after the matching API call
//! succeeds.

pub mod chat;
pub mod notifications;
pub mod patients;
