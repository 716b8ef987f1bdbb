//! Signed URL provider backends.

pub mod local;
pub mod s3;

pub use local::LocalProvider;
pub use s3::S3Provider;
