//! Shared utilities and common types for the signage backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (API key generation, hashing, redaction)
//! - Identifier generation (timestamp + random suffix schemes)
//! - Common validation logic

pub mod crypto;
pub mod ids;
pub mod validation;
