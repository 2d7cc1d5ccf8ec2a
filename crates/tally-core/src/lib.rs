//! # Tally Core
//!
//! The fixed-window rate limiting protocol.
//! This crate holds the decision logic and the store port it runs against;
//! it has no infrastructure dependencies and keeps no mutable state of its own.

pub mod config;
pub mod domain;
pub mod error;
pub mod limiter;
pub mod ports;

pub use config::LimiterConfig;
pub use domain::{Decision, RateLimitPolicy};
pub use error::LimiterError;
pub use limiter::{AtomicWindowLimiter, RateLimiter, WindowLimiter};
