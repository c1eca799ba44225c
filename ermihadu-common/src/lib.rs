//! # ERMIHADU Common Library
//!
//! Shared code for the ERMIHADU items vault:
//! - Item, person and uploader-label models
//! - Fetch/parse layer for CSV exports and values-range rows
//! - Filter/sort of the in-memory item list
//! - Form draft and submission validation
//! - Audio recording state machine
//! - Application store (state + reducer)
//! - Event types, configuration loading

pub mod config;
pub mod draft;
pub mod error;
pub mod events;
pub mod filter;
pub mod model;
pub mod recorder;
pub mod records;
pub mod time;
pub mod view;

pub use error::{Error, Result};
pub use model::{Item, ItemId, People, Size, UploaderLabel};
