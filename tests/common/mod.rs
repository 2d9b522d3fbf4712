//! Common test utilities for integration tests.
//!
//! # Modules
//!
//! - `logger`: Per-test phase logging
//! - `log_capture`: Capture `tracing` events for assertions
//! - `mocks`: wiremock responders for provider endpoints

pub mod log_capture;
pub mod logger;
pub mod mocks;
