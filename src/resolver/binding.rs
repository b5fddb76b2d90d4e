//! Binding keys and provenance.

use std::fmt;
use std::path::{Path, PathBuf};

/// Pseudo file name used for bindings supplied outside any config file.
pub const EXTRA_BINDINGS_SOURCE: &str = "<bindings>";

/// `(scope, parameter)` pair a value is bound to.
///
/// `scope` is `None` for global-scope bindings (`weight_decay = ...`).
/// Otherwise it holds everything left of the last `.` verbatim, including
/// any `scope/` prefix or module qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey {
    pub scope: Option<String>,
    pub parameter: String,
}

impl BindingKey {
    pub fn new(scope: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            parameter: parameter.into(),
        }
    }

    pub fn global(parameter: impl Into<String>) -> Self {
        Self {
            scope: None,
            parameter: parameter.into(),
        }
    }

    /// Split a binding target such as `train/LearnerConfig.learning_rate`
    /// at its last `.`.
    pub fn from_target(target: &str) -> Self {
        match target.rsplit_once('.') {
            Some((scope, parameter)) => Self::new(scope, parameter),
            None => Self::global(target),
        }
    }

    pub fn is_global(&self) -> bool {
        self.scope.is_none()
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{scope}.{}", self.parameter),
            None => f.write_str(&self.parameter),
        }
    }
}

/// Where a binding was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub file: PathBuf,
    pub line: usize,
}

impl Origin {
    pub fn new(file: &Path, line: usize) -> Self {
        Self {
            file: file.to_path_buf(),
            line,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_splits_at_last_dot() {
        let key = BindingKey::from_target("meta_dataset.learners.Learner.embedding_fn");
        assert_eq!(key.scope.as_deref(), Some("meta_dataset.learners.Learner"));
        assert_eq!(key.parameter, "embedding_fn");
    }

    #[test]
    fn bare_target_is_global() {
        let key = BindingKey::from_target("weight_decay");
        assert!(key.is_global());
        assert_eq!(key.to_string(), "weight_decay");
    }

    #[test]
    fn scope_path_stays_in_scope() {
        let key = BindingKey::from_target("train/LearnerConfig.learning_rate");
        assert_eq!(key.scope.as_deref(), Some("train/LearnerConfig"));
        assert_eq!(key.to_string(), "train/LearnerConfig.learning_rate");
    }

    #[test]
    fn globals_sort_first() {
        let mut keys = vec![
            BindingKey::new("A", "x"),
            BindingKey::global("z"),
            BindingKey::new("A", "a"),
        ];
        keys.sort();
        assert_eq!(keys[0], BindingKey::global("z"));
        assert_eq!(keys[1], BindingKey::new("A", "a"));
    }
}
