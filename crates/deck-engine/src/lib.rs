//! Publish orchestration for deck
//!
//! [`Publisher`] sequences rendering, upload, the two verification passes
//! and the completion notice for one batch at a time.

pub mod publisher;
pub mod record;
pub mod report;

pub use publisher::{Publisher, PublisherSettings};
pub use record::{AttemptFailure, BatchRecord, Event, Stage};
pub use report::{Outcome, PublishReport};
