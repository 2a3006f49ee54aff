//! Domain layer for the signage backend.
//!
//! This crate contains:
//! - Domain models (Screen, Asset, ScreenGroup, playlists, heartbeats)
//! - The screen-group content engine (image splitting, tile fan-out and
//!   retraction, membership rules, duration propagation)
//! - Storage and blob-store abstractions the engine runs against
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;

pub use errors::{ConflictKind, DomainError, ErrorKind, StoreError};
