//! Public settings types.
//!
//! These are the resolved, ready-to-use structs the binary consumes.
//! Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

use crate::resolver::{OverridePolicy, Resolver};

/// Resolver section of the tool settings.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Directories searched for include targets, in order.
    pub search_paths: Vec<PathBuf>,
    /// Reject a second binding of the same key instead of overriding it.
    pub strict: bool,
    /// Extra binding lines applied after the root file.
    pub bindings: Vec<String>,
}

impl ResolverSettings {
    pub fn policy(&self) -> OverridePolicy {
        if self.strict {
            OverridePolicy::RejectDuplicates
        } else {
            OverridePolicy::LastWriteWins
        }
    }

    /// Build a [`Resolver`] from these settings.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.search_paths.iter().cloned())
            .with_policy(self.policy())
            .with_bindings(self.bindings.iter().cloned())
    }
}

/// Top-level tool settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub resolver: ResolverSettings,
}
