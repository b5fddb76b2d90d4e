//! Core infrastructure shared by the library and the `metaconf` binary.
//!
//! - **config**: tool settings loading and resolved types.
//! - **error**: application-wide error enum.

pub mod config;
pub mod error;
