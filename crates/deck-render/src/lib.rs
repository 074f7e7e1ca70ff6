//! Renderer adapters
//!
//! - [`CopyRenderer`] places the source image itself as the slide (local
//!   copy or HTTP download)
//! - [`CommandRenderer`] delegates to an external render worker process

pub mod command;
pub mod copy;

pub use command::CommandRenderer;
pub use copy::CopyRenderer;
