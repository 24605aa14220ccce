//! ABOUTME: Core error type, tracing setup and timing utilities
//! ABOUTME: Foundation crate used by every motion-detector component

pub mod error;
pub mod telemetry;
pub mod time;

pub use error::{Error, Result};
pub use time::MonotonicTimer;
