//! Serving generated interceptor modules in place of their targets.
//!
//! A bundler asks [`VirtualModules::resolve_id`] for each resolved import.
//! Intercepted files map to a virtual id whose [`load`](VirtualModules::load)
//! returns the generated source. Imports carrying the `?original` query, and
//! imports made from the virtual module itself, are left alone.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::interceptors::{InterceptorSet, ORIGINAL_QUERY};

/// Prefix of virtual interceptor module ids.
pub const VIRTUAL_PREFIX: &str = "\0interceptor:";

/// Generated sources by target path
#[derive(Debug, Clone, Default)]
pub struct VirtualModules {
    sources: HashMap<PathBuf, String>,
}

impl VirtualModules {
    pub fn from_set(set: &InterceptorSet) -> Self {
        let sources = set
            .iter()
            .map(|(_, interceptor)| (interceptor.target_path.clone(), interceptor.source.clone()))
            .collect();
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// `\0interceptor:<path>`
    pub fn virtual_id(path: &Path) -> String {
        format!("{}{}", VIRTUAL_PREFIX, path.display())
    }

    /// Virtual id to substitute for `resolved`, if any.
    pub fn resolve_id(&self, resolved: &str, importer: Option<&str>) -> Option<String> {
        if self.sources.is_empty() || resolved.starts_with('\0') {
            return None;
        }

        let (path, query) = match resolved.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (resolved, None),
        };
        if query.is_some_and(|q| q.split('&').any(|part| part == ORIGINAL_QUERY)) {
            return None;
        }

        let path = Path::new(path);
        if !self.sources.contains_key(path) {
            return None;
        }

        let id = Self::virtual_id(path);
        if importer == Some(id.as_str()) {
            return None;
        }
        Some(id)
    }

    /// Generated source for a virtual id.
    pub fn load(&self, id: &str) -> Option<&str> {
        let path = id.strip_prefix(VIRTUAL_PREFIX)?;
        self.sources.get(Path::new(path)).map(String::as_str)
    }
}
