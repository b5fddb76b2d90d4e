//! Tool settings loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `METACONF_SEARCH_PATH` and `METACONF_LOG_LEVEL` env overrides.
//! These settings drive the `metaconf` binary; the binding files it resolves
//! are a separate format handled by [`crate::resolver`].
//!
//! # Module layout
//!
//! - **types**: Public settings structs (`Config`, `ResolverSettings`).
//! - **raw**: Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load**: Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{DEFAULT_SETTINGS_PATH, expand_home, load, load_from};
pub use types::*;
