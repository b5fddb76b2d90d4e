//! Include expansion and binding application.
//!
//! Files are expanded depth-first. All of a file's includes are applied, in
//! the order written, before the file's own bindings, so the including file
//! wins on every collision no matter where its `include` lines sit. The stack
//! of files currently being expanded is what detects cycles; including the
//! same file from two branches is allowed and simply re-applies it.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use super::binding::{BindingKey, EXTRA_BINDINGS_SOURCE, Origin};
use super::error::ResolveError;
use super::parse::{Statement, parse_source};
use super::resolved::{Entry, ResolvedConfig};
use super::value::{MAX_NESTING, Value};

/// What happens when a key is bound a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverridePolicy {
    /// The later binding replaces the earlier one.
    #[default]
    LastWriteWins,
    /// A second binding of the same key is a [`ResolveError::DuplicateScopeConflict`].
    RejectDuplicates,
}

/// Reusable resolution settings. Each call to [`Resolver::resolve`] starts
/// from scratch and returns a fresh [`ResolvedConfig`].
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    search_paths: Vec<PathBuf>,
    policy: OverridePolicy,
    bindings: Vec<String>,
}

impl Resolver {
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: OverridePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Extra binding lines applied after the root file, in order.
    pub fn with_bindings<I, S>(mut self, bindings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bindings.extend(bindings.into_iter().map(Into::into));
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn policy(&self) -> OverridePolicy {
        self.policy
    }

    /// Resolve `root` and everything it includes.
    ///
    /// `root` is tried as given, then against each search path.
    pub fn resolve(&self, root: impl AsRef<Path>) -> Result<ResolvedConfig, ResolveError> {
        let root = root.as_ref();
        let mut run = Resolution::new(self);
        let located = self.locate(root, Some(Path::new("")))?;
        run.apply_file(&located)?;
        run.apply_extra_bindings()?;
        let config = run.finish()?;
        info!(
            root = %located.display(),
            bindings = config.len(),
            files = config.sources().len(),
            "configuration resolved"
        );
        Ok(config)
    }

    /// Resolve in-memory text. `name` labels error messages and provenance;
    /// includes are looked up on the search paths only.
    pub fn resolve_str(&self, text: &str, name: &str) -> Result<ResolvedConfig, ResolveError> {
        let mut run = Resolution::new(self);
        let label = PathBuf::from(name);
        let statements = parse_source(text, &label)?;
        run.apply_statements(statements, &label, None)?;
        run.apply_extra_bindings()?;
        run.finish()
    }

    /// Find `target` relative to `first` (if given) and then each search
    /// path. Absolute targets are only checked where they point.
    fn locate(&self, target_path: &Path, first: Option<&Path>) -> Result<PathBuf, ResolveError> {
        if target_path.is_absolute() {
            return if target_path.is_file() {
                Ok(target_path.to_path_buf())
            } else {
                Err(ResolveError::MissingFile {
                    path: target_path.to_path_buf(),
                    searched: Vec::new(),
                })
            };
        }

        let dirs = first
            .into_iter()
            .chain(self.search_paths.iter().map(PathBuf::as_path));
        let mut searched = Vec::new();
        for dir in dirs {
            let candidate = dir.join(target_path);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(if dir.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                dir.to_path_buf()
            });
        }
        Err(ResolveError::MissingFile {
            path: target_path.to_path_buf(),
            searched,
        })
    }
}

/// Resolve `root` with default settings.
pub fn resolve<I, P>(root: impl AsRef<Path>, search_paths: I) -> Result<ResolvedConfig, ResolveError>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    Resolver::new(search_paths).resolve(root)
}

/// State of a single resolution run.
struct Resolution<'r> {
    resolver: &'r Resolver,
    entries: BTreeMap<BindingKey, Entry>,
    /// Canonical paths of the files currently being expanded, outermost first.
    stack: Vec<PathBuf>,
    sources: Vec<PathBuf>,
    imports: Vec<String>,
}

impl<'r> Resolution<'r> {
    fn new(resolver: &'r Resolver) -> Self {
        Self {
            resolver,
            entries: BTreeMap::new(),
            stack: Vec::new(),
            sources: Vec::new(),
            imports: Vec::new(),
        }
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ResolveError> {
        let canonical = path.canonicalize().map_err(|e| io_error(path, e))?;
        if self.stack.contains(&canonical) {
            let mut chain = self.stack.clone();
            chain.push(canonical);
            return Err(ResolveError::CyclicInclude { chain });
        }

        let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        debug!(file = %path.display(), depth = self.stack.len(), "reading config file");

        let statements = parse_source(&text, path)?;
        self.stack.push(canonical);
        self.sources.push(path.to_path_buf());
        let base_dir = path.parent().unwrap_or(Path::new(""));
        self.apply_statements(statements, path, Some(base_dir))?;
        self.stack.pop();
        Ok(())
    }

    fn apply_statements(
        &mut self,
        statements: Vec<Statement>,
        file: &Path,
        base_dir: Option<&Path>,
    ) -> Result<(), ResolveError> {
        let (includes, own): (Vec<_>, Vec<_>) = statements
            .into_iter()
            .partition(|statement| matches!(statement, Statement::Include { .. }));

        // Every include is expanded before any of this file's own bindings,
        // wherever the include line sits.
        for statement in includes {
            if let Statement::Include { path, line } = statement {
                let target = self.resolver.locate(Path::new(&path), base_dir)?;
                debug!(
                    from = %file.display(),
                    line,
                    include = %target.display(),
                    "following include"
                );
                self.apply_file(&target)?;
            }
        }

        for statement in own {
            match statement {
                Statement::Import { module, .. } => {
                    if !self.imports.contains(&module) {
                        self.imports.push(module);
                    }
                }
                Statement::Binding { key, value, line } => {
                    self.bind(key, value, Origin::new(file, line))?;
                }
                Statement::Include { .. } => {}
            }
        }
        Ok(())
    }

    fn apply_extra_bindings(&mut self) -> Result<(), ResolveError> {
        if self.resolver.bindings.is_empty() {
            return Ok(());
        }
        let text = self.resolver.bindings.join("\n");
        let label = PathBuf::from(EXTRA_BINDINGS_SOURCE);
        let statements = parse_source(&text, &label)?;
        self.apply_statements(statements, &label, None)
    }

    fn bind(&mut self, key: BindingKey, value: Value, origin: Origin) -> Result<(), ResolveError> {
        trace!(key = %key, value = %value, origin = %origin, "binding");
        if let Some(previous) = self.entries.get(&key) {
            match self.resolver.policy {
                OverridePolicy::RejectDuplicates => {
                    return Err(ResolveError::DuplicateScopeConflict {
                        key,
                        first: previous.origin.clone(),
                        second: origin,
                    });
                }
                OverridePolicy::LastWriteWins => {
                    debug!(
                        key = %key,
                        old = %previous.value,
                        new = %value,
                        at = %origin,
                        "binding overridden"
                    );
                }
            }
        }
        self.entries.insert(key, Entry { value, origin });
        Ok(())
    }

    fn finish(self) -> Result<ResolvedConfig, ResolveError> {
        let entries = expand_macros(self.entries)?;
        Ok(ResolvedConfig::new(entries, self.sources, self.imports))
    }
}

fn io_error(path: &Path, source: io::Error) -> ResolveError {
    if source.kind() == io::ErrorKind::NotFound {
        ResolveError::MissingFile {
            path: path.to_path_buf(),
            searched: Vec::new(),
        }
    } else {
        ResolveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Replace every `%NAME` with the final value of the global binding `NAME`.
fn expand_macros(
    mut entries: BTreeMap<BindingKey, Entry>,
) -> Result<BTreeMap<BindingKey, Entry>, ResolveError> {
    let mut expander = MacroExpander {
        globals: entries
            .iter()
            .filter(|(key, _)| key.is_global())
            .map(|(key, entry)| (key.parameter.clone(), entry.value.clone()))
            .collect(),
        expanded: HashMap::new(),
        visiting: Vec::new(),
    };

    for (key, entry) in entries.iter_mut() {
        let Some(first) = entry.value.macro_names().first().map(|n| n.to_string()) else {
            continue;
        };
        let value = entry
            .value
            .substitute_macros(&mut |name| expander.expand(name, key))?;
        if value.depth() > MAX_NESTING {
            return Err(too_deep(&first, key));
        }
        entry.value = value;
    }
    Ok(entries)
}

fn too_deep(name: &str, key: &BindingKey) -> ResolveError {
    ResolveError::MacroTooDeep {
        name: name.to_string(),
        key: key.clone(),
        limit: MAX_NESTING,
    }
}

struct MacroExpander {
    globals: HashMap<String, Value>,
    expanded: HashMap<String, Value>,
    visiting: Vec<String>,
}

impl MacroExpander {
    fn expand(&mut self, name: &str, key: &BindingKey) -> Result<Value, ResolveError> {
        if let Some(value) = self.expanded.get(name) {
            return Ok(value.clone());
        }
        if self.visiting.iter().any(|n| n == name) {
            return Err(ResolveError::CyclicMacro {
                name: name.to_string(),
            });
        }
        let raw = self
            .globals
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::UndefinedMacro {
                name: name.to_string(),
                key: key.clone(),
            })?;

        if self.visiting.len() >= MAX_NESTING {
            return Err(too_deep(name, key));
        }

        self.visiting.push(name.to_string());
        let value = raw.substitute_macros(&mut |inner| self.expand(inner, key))?;
        self.visiting.pop();
        if value.depth() > MAX_NESTING {
            return Err(too_deep(name, key));
        }
        self.expanded.insert(name.to_string(), value.clone());
        Ok(value)
    }
}
