//! Integrations with services outside the database.

pub mod blob_storage;

pub use blob_storage::{build_blob_store, HttpBlobStore, LocalBlobStore};
