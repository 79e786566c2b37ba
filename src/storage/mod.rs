//! File storage module
//!
//! Local two-zone store for uploaded and processed PDF artifacts.

mod file_store;

pub use file_store::{generate_filename, sanitize_filename, split_extension, FileStore, Zone};
