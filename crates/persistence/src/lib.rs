//! Persistence layer for the signage backend.
//!
//! This crate contains:
//! - Database connection management and SQL migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional content store

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
