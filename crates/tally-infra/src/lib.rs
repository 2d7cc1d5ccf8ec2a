//! # Tally Infrastructure
//!
//! Concrete implementations of the store ports defined in `tally-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `redis` - Redis-backed counter store

pub mod store;

pub use store::InMemoryStore;

#[cfg(feature = "redis")]
pub use store::{RedisConfig, RedisStore};
