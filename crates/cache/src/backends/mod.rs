//! Key-value store backends.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;
