//! The read-only result of a resolution run.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use super::binding::{BindingKey, Origin};
use super::error::ResolveError;
use super::value::{FromValue, Reference, Value};

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Entry {
    pub value: Value,
    pub origin: Origin,
}

/// Flat `(scope, parameter) -> value` mapping produced by a resolver.
///
/// Iteration order is fixed: global bindings first, then scopes and
/// parameters in lexical order. References stay symbolic; instantiating
/// them is the consumer's business.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    entries: BTreeMap<BindingKey, Entry>,
    sources: Vec<PathBuf>,
    imports: Vec<String>,
}

impl ResolvedConfig {
    pub(super) fn new(
        entries: BTreeMap<BindingKey, Entry>,
        sources: Vec<PathBuf>,
        imports: Vec<String>,
    ) -> Self {
        Self {
            entries,
            sources,
            imports,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BindingKey, &Value)> {
        self.entries.iter().map(|(k, e)| (k, &e.value))
    }

    pub fn get(&self, scope: &str, parameter: &str) -> Option<&Value> {
        self.get_key(&BindingKey::new(scope, parameter))
    }

    pub fn get_or(&self, scope: &str, parameter: &str, default: Value) -> Value {
        self.get(scope, parameter).cloned().unwrap_or(default)
    }

    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.get_key(&BindingKey::global(name))
    }

    pub fn get_key(&self, key: &BindingKey) -> Option<&Value> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Typed lookup. `Ok(None)` when unbound, `TypeMismatch` when bound to
    /// something `T` cannot represent.
    pub fn get_as<T: FromValue>(
        &self,
        scope: &str,
        parameter: &str,
    ) -> Result<Option<T>, ResolveError> {
        let Some(value) = self.get(scope, parameter) else {
            return Ok(None);
        };
        T::from_value(value)
            .map(Some)
            .ok_or_else(|| ResolveError::TypeMismatch {
                key: BindingKey::new(scope, parameter).to_string(),
                expected: T::EXPECTED,
                found: format!("{} {value}", value.type_name()),
            })
    }

    /// Look up `configurable.parameter` as seen from inside `scope_path`
    /// (`"train/inner"`): `train/inner/C.p`, then `train/C.p`, then `C.p`.
    pub fn get_in_scope(
        &self,
        scope_path: &str,
        configurable: &str,
        parameter: &str,
    ) -> Option<&Value> {
        let components: Vec<&str> = scope_path.split('/').filter(|s| !s.is_empty()).collect();
        (0..=components.len()).rev().find_map(|depth| {
            let scope = if depth == 0 {
                configurable.to_string()
            } else {
                format!("{}/{configurable}", components[..depth].join("/"))
            };
            self.get(&scope, parameter)
        })
    }

    pub fn origin(&self, key: &BindingKey) -> Option<&Origin> {
        self.entries.get(key).map(|e| &e.origin)
    }

    /// Distinct scopes with at least one binding, in iteration order.
    pub fn scopes(&self) -> Vec<&str> {
        let mut scopes: Vec<&str> = self
            .entries
            .keys()
            .filter_map(|k| k.scope.as_deref())
            .collect();
        scopes.dedup();
        scopes
    }

    pub fn bindings_for<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.entries
            .iter()
            .filter(move |(k, _)| k.scope.as_deref() == Some(scope))
            .map(|(k, e)| (k.parameter.as_str(), &e.value))
    }

    /// Every reference value, including ones nested in containers, with the
    /// key it is bound under.
    pub fn references(&self) -> Vec<(&BindingKey, &Reference)> {
        let mut out = Vec::new();
        for (key, entry) in &self.entries {
            entry.value.for_each_reference(&mut |r| out.push((key, r)));
        }
        out
    }

    /// Files read, in the order they were first opened.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Modules named by `import` lines, first occurrence order.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Render the operative configuration in binding-file syntax. Parsing
    /// the output yields the same mapping.
    pub fn to_config_string(&self) -> String {
        let mut out = String::new();
        for module in &self.imports {
            let _ = writeln!(out, "import {module}");
        }

        let mut current: Option<Option<&str>> = None;
        for (key, entry) in &self.entries {
            let scope = key.scope.as_deref();
            if current != Some(scope) {
                if !out.is_empty() {
                    out.push('\n');
                }
                if let Some(scope) = scope {
                    let _ = writeln!(out, "# Parameters for {scope}:");
                }
                current = Some(scope);
            }
            let _ = writeln!(out, "{key} = {}", entry.value);
        }
        out
    }

    /// JSON object keyed by `Scope.parameter`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, e)| (k.to_string(), e.value.to_json()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a ResolvedConfig {
    type Item = (&'a BindingKey, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
