//! Shared test utilities for PDF engine server integration tests.
//!
//! This module provides:
//! - `TestApp`: router, state and temp directories for one isolated server
//! - PDF builders producing small multi-page documents with lopdf

pub mod harness;
pub mod pdf;

pub use harness::{TestApp, ADMIN_KEY, ALICE_KEY, BOB_KEY};
pub use pdf::{encrypted_pdf, page_labels, sample_pdf};
