//! Durable records: the aggregate state document and the relay outbox.

pub mod error;
pub mod outbox;
pub mod store;

pub use error::StoreError;
pub use outbox::{Outbox, OutboxMessage, OutboxStatus};
pub use store::StateStore;
