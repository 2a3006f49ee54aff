//! Custom Axum extractors.

pub mod screen_key;

pub use screen_key::{ScreenAuth, API_KEY_HEADER};
