//! Bootstrap layer: runs before any configuration is resolved.
//!
//! - **logger**: tracing-subscriber initialisation.

pub mod logger;
