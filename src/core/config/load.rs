//! Settings loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `METACONF_SEARCH_PATH` and `METACONF_LOG_LEVEL` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;

use super::raw::{self, RawConfig};
use super::types::*;

/// Default settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "config/default.toml";

/// Deep-merge two TOML values.
/// Tables are merged recursively: the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a settings file, follow any `[meta] base = "..."` chain, and return
/// the fully merged `toml::Value`. `visited` carries canonicalized paths
/// already seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        debug!(settings = %path.display(), base = %base_path.display(), "following settings base");
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load settings from the given path, or `config/default.toml`, then apply
/// env-var overrides. If no path is given and `config/default.toml` does not
/// exist, built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let search_override = env_search_paths();
    let log_level_override = env::var("METACONF_LOG_LEVEL").ok();

    if let Some(path) = config_path {
        return load_from(
            Path::new(path),
            &search_override,
            log_level_override.as_deref(),
        );
    }

    let default_path = Path::new(DEFAULT_SETTINGS_PATH);
    if default_path.exists() {
        load_from(
            default_path,
            &search_override,
            log_level_override.as_deref(),
        )
    } else {
        Ok(Config {
            log_level: log_level_override.unwrap_or_else(raw::default_log_level),
            resolver: ResolverSettings {
                search_paths: search_override,
                strict: false,
                bindings: Vec::new(),
            },
        })
    }
}

/// Internal loader: accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
/// `extra_search_paths` are searched before the ones in the file.
pub fn load_from(
    path: &Path,
    extra_search_paths: &[PathBuf],
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    let search_paths = extra_search_paths
        .iter()
        .cloned()
        .chain(parsed.resolver.search_paths.iter().map(|p| expand_home(p)))
        .collect();

    Ok(Config {
        log_level: log_level_override
            .map(str::to_string)
            .unwrap_or(parsed.logging.level),
        resolver: ResolverSettings {
            search_paths,
            strict: parsed.resolver.strict,
            bindings: parsed.resolver.bindings,
        },
    })
}

/// `METACONF_SEARCH_PATH` split with the platform path-list separator.
fn env_search_paths() -> Vec<PathBuf> {
    env::var_os("METACONF_SEARCH_PATH")
        .map(|v| env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default()
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
