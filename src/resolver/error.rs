//! Resolution error types.

use std::path::PathBuf;

use thiserror::Error;

use super::binding::{BindingKey, Origin};

/// Every way resolving a configuration can fail. All of them are fatal to the
/// loading phase; no partial mapping is ever returned alongside one.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("config file '{}' not found (searched: {})", path.display(), join_paths(searched))]
    MissingFile { path: PathBuf, searched: Vec<PathBuf> },

    #[error("cyclic include: {}", join_chain(chain))]
    CyclicInclude { chain: Vec<PathBuf> },

    #[error("{}:{line}: {message}", file.display())]
    MalformedBinding {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("type mismatch for {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("{key} bound twice (first at {first}, again at {second})")]
    DuplicateScopeConflict {
        key: BindingKey,
        first: Origin,
        second: Origin,
    },

    #[error("undefined macro %{name} referenced by {key}")]
    UndefinedMacro { name: String, key: BindingKey },

    #[error("macro %{name} refers to itself")]
    CyclicMacro { name: String },

    #[error("macro %{name} used by {key} nests more than {limit} levels deep")]
    MacroTooDeep {
        name: String,
        key: BindingKey,
        limit: usize,
    },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<none>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_lists_candidates() {
        let e = ResolveError::MissingFile {
            path: PathBuf::from("learners/proto.gin"),
            searched: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        };
        let msg = e.to_string();
        assert!(msg.contains("learners/proto.gin"));
        assert!(msg.contains("/a, /b"));
    }

    #[test]
    fn cyclic_include_shows_chain() {
        let e = ResolveError::CyclicInclude {
            chain: vec![
                PathBuf::from("a.gin"),
                PathBuf::from("b.gin"),
                PathBuf::from("a.gin"),
            ],
        };
        assert_eq!(e.to_string(), "cyclic include: a.gin -> b.gin -> a.gin");
    }

    #[test]
    fn malformed_binding_points_at_line() {
        let e = ResolveError::MalformedBinding {
            file: PathBuf::from("x.gin"),
            line: 7,
            message: "expected '='".into(),
        };
        assert_eq!(e.to_string(), "x.gin:7: expected '='");
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error;
        let e = ResolveError::Io {
            path: PathBuf::from("x.gin"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("denied"));
    }
}
