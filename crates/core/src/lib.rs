//! Core domain types and shared logic for the Cabinet file-metadata service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - File lifecycle status
//! - Storage object keys (`tenant/device/fileID`)
//! - Configuration for every subsystem

pub mod config;
pub mod error;
pub mod object_key;
pub mod status;

pub use error::{Error, Result};
pub use object_key::ObjectKey;
pub use status::FileStatus;

/// Prefix used by storage connectivity probes. Objects written under this
/// prefix are not files and must never reach the metadata store.
pub const STORAGE_VERIFY_PREFIX: &str = "storage_verify";
