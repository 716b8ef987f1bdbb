//! HTTP request handlers.

mod admin;
mod files;
mod health;

pub use admin::{archive_bucket, run_scavenger};
pub use files::{create_file, delete_file, get_file, get_signed_url, list_files};
pub use health::health_check;
