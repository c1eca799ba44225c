//! Vault services: refreshing the item list and the upload pipeline

pub mod refresh;
pub mod submission;

pub use refresh::{refresh_for_view, refresh_items, LOAD_FAILED_MESSAGE};
pub use submission::{submit_draft, upload_submission, SubmitError};
