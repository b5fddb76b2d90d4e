// Library root: the resolver API consumed by training code, plus the
// settings and logging pieces shared with the `metaconf` binary.

pub mod bootstrap;
pub mod core;
pub mod resolver;

pub use self::core::{config, error};
pub use resolver::{
    BindingKey, FromValue, OverridePolicy, Reference, ResolveError, ResolvedConfig, Resolver,
    Value, resolve,
};
