//! Binding-file resolver.
//!
//! Turns a root binding file and everything it includes into a flat,
//! read-only [`ResolvedConfig`].
//!
//! # Module layout
//!
//! - **lexer**: tokens; newlines only count outside brackets.
//! - **parse**: statements (`include`, `import`, bindings) and value literals.
//! - **value**: [`Value`], [`Reference`] and typed extraction via [`FromValue`].
//! - **binding**: [`BindingKey`] and [`Origin`] provenance.
//! - **resolve**: include expansion, override policy, macro expansion.
//! - **resolved**: the result type and its accessors.
//! - **error**: [`ResolveError`].

mod binding;
mod error;
mod lexer;
mod parse;
mod resolve;
mod resolved;
mod value;

pub use binding::{BindingKey, EXTRA_BINDINGS_SOURCE, Origin};
pub use error::ResolveError;
pub use parse::{Statement, parse_source};
pub use resolve::{OverridePolicy, Resolver, resolve};
pub use resolved::ResolvedConfig;
pub use value::{FromValue, Reference, Value};
