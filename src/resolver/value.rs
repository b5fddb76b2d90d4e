//! Bound values and typed extraction.

use std::fmt;

/// A symbolic pointer to another configured scope.
///
/// `@Name()` asks the consumer to construct `Name` and pass the result;
/// `@Name` passes the configurable itself. References are never resolved
/// here, so two occurrences are equal exactly when they spell the same name
/// in the same form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub name: String,
    pub evaluate: bool,
}

impl Reference {
    pub fn new(name: impl Into<String>, evaluate: bool) -> Self {
        Self {
            name: name.into(),
            evaluate,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.evaluate {
            write!(f, "@{}()", self.name)
        } else {
            write!(f, "@{}", self.name)
        }
    }
}

/// Deepest container nesting a value may have, whether written out or built
/// up by macro expansion.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Reference(Reference),
    /// `%NAME`; replaced by the global binding `NAME` before a
    /// [`ResolvedConfig`](super::ResolvedConfig) is handed out.
    Macro(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::None => "None",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Reference(_) => "reference",
            Value::Macro(_) => "macro",
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Container nesting depth; scalars are 0, `[1]` is 1, `[[1]]` is 2.
    pub fn depth(&self) -> usize {
        match self {
            Value::List(items) | Value::Tuple(items) => {
                1 + items.iter().map(Value::depth).max().unwrap_or(0)
            }
            Value::Dict(entries) => {
                1 + entries
                    .iter()
                    .map(|(k, v)| k.depth().max(v.depth()))
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Visit every reference in this value, descending into containers.
    pub fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a Reference)) {
        match self {
            Value::Reference(r) => f(r),
            Value::List(items) | Value::Tuple(items) => {
                for item in items {
                    item.for_each_reference(&mut *f);
                }
            }
            Value::Dict(entries) => {
                for (k, v) in entries {
                    k.for_each_reference(&mut *f);
                    v.for_each_reference(&mut *f);
                }
            }
            _ => {}
        }
    }

    /// Names of the macros used anywhere in this value.
    pub fn macro_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_macros(&mut out);
        out
    }

    fn collect_macros<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::Macro(name) => out.push(name),
            Value::List(items) | Value::Tuple(items) => {
                for item in items {
                    item.collect_macros(out);
                }
            }
            Value::Dict(entries) => {
                for (k, v) in entries {
                    k.collect_macros(out);
                    v.collect_macros(out);
                }
            }
            _ => {}
        }
    }

    /// Rebuild the value with each macro replaced by `lookup(name)`.
    pub fn substitute_macros<E>(
        &self,
        lookup: &mut impl FnMut(&str) -> Result<Value, E>,
    ) -> Result<Value, E> {
        Ok(match self {
            Value::Macro(name) => lookup(name)?,
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|v| v.substitute_macros(&mut *lookup))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Tuple(items) => Value::Tuple(
                items
                    .iter()
                    .map(|v| v.substitute_macros(&mut *lookup))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Dict(entries) => Value::Dict(
                entries
                    .iter()
                    .map(|(k, v)| {
                        let key = k.substitute_macros(&mut *lookup)?;
                        Ok::<_, E>((key, v.substitute_macros(&mut *lookup)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            other => other.clone(),
        })
    }

    /// JSON rendering. References and macros become their source spelling.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Int(i) => Json::from(*i),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::Bool(b) => Json::Bool(*b),
            Value::None => Json::Null,
            Value::List(items) | Value::Tuple(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Dict(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Value::Str(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
            Value::Reference(r) => Json::String(r.to_string()),
            Value::Macro(name) => Json::String(format!("%{name}")),
        }
    }
}

/// Renders in config-file syntax; the output parses back to an equal value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            // Debug keeps a trailing `.0` on integral floats.
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write_quoted(f, s),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::None => f.write_str("None"),
            Value::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Reference(r) => write!(f, "{r}"),
            Value::Macro(name) => write!(f, "%{name}"),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

// ── Typed extraction ────────────────────────────────────────────────────────

/// Conversion used by [`ResolvedConfig::get_as`](super::ResolvedConfig::get_as).
pub trait FromValue: Sized {
    /// Human-readable name of the expected type, used in mismatch errors.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            const EXPECTED: &'static str = stringify!($t);

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Int(i) => <$t>::try_from(*i).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

int_from_value!(i32, u32, u64, usize);

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Reference {
    const EXPECTED: &'static str = "reference";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_reference().cloned()
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) | Value::Tuple(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::None => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}
