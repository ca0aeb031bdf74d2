//! sea-orm entities owned by the accounts service.

pub mod auth_codes;
pub mod auth_tokens;
pub mod outbox_events;
pub mod users;
