//! Storage layer for deck
//!
//! This crate provides:
//! - A filesystem destination backend (uploader + folder inspector)
//! - Batch record persistence for pause/resume
//! - Project folder naming

pub mod error;
pub mod folder;
pub mod naming;
pub mod record;

pub use error::{Result, StorageError};
pub use folder::{FolderStore, write_manifest};
pub use naming::project_folder_name;
pub use record::RecordStore;
