//! Notifier adapters and message composition

pub mod message;
pub mod outbox;
pub mod webhook;

pub use message::{compose_delivery_message, merge_recipients};
pub use outbox::OutboxNotifier;
pub use webhook::WebhookNotifier;
