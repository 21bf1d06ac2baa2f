//! Themeweave - theme/module inheritance resolution and interceptor builds
//!
//! Resolves which component file a theme sees for every
//! `Module::relative/path` identifier, merges theme and module configuration
//! down the theme chain, and turns declared before/around/after advice into
//! runtime registrations plus generated replacement modules for a bundler.
//!
//! All per-theme state lives in a [`BuildSession`].

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod identifier;
pub mod index;
pub mod interceptors;
pub mod loader;
pub mod module_config;
pub mod session;
pub mod theme;
pub mod virtual_modules;

mod cache;

pub use catalog::{Catalog, CatalogError, ModuleDefinition, ThemeDefinition};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use identifier::Identifier;
pub use index::{cached_component_index, component_index, write_component_index, ComponentIndex};
pub use interceptors::{
    build_interceptors, collect_declared_advice, AdviceDeclaration, Interceptor, InterceptorSet,
};
pub use loader::{LoadError, LoadedModule, ModuleLoader, StaticLoader};
pub use module_config::{merged_module_config, resolve_file_by_theme};
pub use session::{BuildSession, SessionOptions};
pub use theme::{theme_config, IgnoreList, ThemeConfig};
pub use virtual_modules::VirtualModules;

pub use themeweave_intercept::{
    AdviceKind, CallError, Callable, Export, InterceptedModule, InterceptionRegistry, Invocation,
};
