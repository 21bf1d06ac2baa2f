//! Module loading seam.
//!
//! Interceptor builds need the export surface of target and advice modules.
//! The host bundler supplies a [`ModuleLoader`]; [`StaticLoader`] serves
//! modules registered up front.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use themeweave_intercept::{Callable, Export};

/// Loader failures. Always soft during interceptor builds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("module not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load {}: {message}", .path.display())]
    Failed { path: PathBuf, message: String },
}

/// A loaded module's exports, in declaration order.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    path: PathBuf,
    exports: Vec<(String, Export)>,
}

impl LoadedModule {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exports: Vec::new(),
        }
    }

    /// Add (or replace) a function export.
    pub fn with_function(self, name: &str, callable: Callable) -> Self {
        self.with_export(name, Export::Function(callable))
    }

    /// Add (or replace) a plain value export.
    pub fn with_value(self, name: &str, value: Value) -> Self {
        self.with_export(name, Export::Value(value))
    }

    pub fn with_export(mut self, name: &str, export: Export) -> Self {
        match self.exports.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = export,
            None => self.exports.push((name.to_string(), export)),
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exports(&self) -> &[(String, Export)] {
        &self.exports
    }

    pub fn export_names(&self) -> Vec<&str> {
        self.exports.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, export)| export)
    }

    pub fn has_export(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Supplies module export surfaces by absolute path.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<LoadedModule>, LoadError>;
}

/// Loader over modules registered ahead of time.
#[derive(Debug, Default)]
pub struct StaticLoader {
    modules: RwLock<HashMap<PathBuf, Arc<LoadedModule>>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under its own path.
    pub fn insert(&self, module: LoadedModule) {
        self.modules
            .write()
            .insert(module.path.clone(), Arc::new(module));
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, path: &Path) -> Result<Arc<LoadedModule>, LoadError> {
        self.modules
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }
}
