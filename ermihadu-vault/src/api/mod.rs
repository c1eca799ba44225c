//! HTTP handlers for ermihadu-vault
//!
//! Server-rendered pages plus a small JSON API and an SSE stream.

pub mod audio;
pub mod buildinfo;
pub mod health;
pub mod items;
pub mod pages;
pub mod sse;
pub mod static_assets;

pub use audio::audio_routes;
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use items::item_routes;
pub use pages::page_routes;
pub use sse::event_stream;
pub use static_assets::static_routes;
