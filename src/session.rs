//! Build session: catalog, options, loader, diagnostics and per-theme caches
//! for one build.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::cache::SlotCache;
use crate::catalog::Catalog;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::index::ComponentIndex;
use crate::interceptors::{DeclaredAdvice, InterceptorSet};
use crate::loader::{ModuleLoader, StaticLoader};
use crate::theme::ThemeConfig;

const DEFAULT_PRECOMPILED_DIR: &str = ".precompiled";
const DEFAULT_RUNTIME_IMPORT: &str = "themeweave:interception";
const DEFAULT_FS_PREFIX: &str = "/@fs";

/// Session options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Root of persisted per-theme artifacts
    pub precompiled_dir: PathBuf,

    /// Import specifier of the interception runtime in generated modules
    pub runtime_import: String,

    /// Prefix for absolute filesystem imports in generated modules
    pub fs_prefix: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            precompiled_dir: PathBuf::from(DEFAULT_PRECOMPILED_DIR),
            runtime_import: DEFAULT_RUNTIME_IMPORT.to_string(),
            fs_prefix: DEFAULT_FS_PREFIX.to_string(),
        }
    }
}

impl SessionOptions {
    pub fn with_precompiled_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.precompiled_dir = dir.into();
        self
    }

    pub fn with_runtime_import(mut self, specifier: impl Into<String>) -> Self {
        self.runtime_import = specifier.into();
        self
    }

    pub fn with_fs_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fs_prefix = prefix.into();
        self
    }
}

pub(crate) struct SessionCaches {
    pub(crate) theme_configs: SlotCache<Option<Arc<ThemeConfig>>>,
    pub(crate) module_configs: SlotCache<Option<Arc<Value>>>,
    pub(crate) module_base: SlotCache<Arc<ComponentIndex>>,
    pub(crate) component_indexes: SlotCache<Arc<ComponentIndex>>,
    pub(crate) persisted_indexes: SlotCache<Arc<ComponentIndex>>,
    pub(crate) declared_advice: SlotCache<Arc<DeclaredAdvice>>,
    pub(crate) interceptors: SlotCache<Arc<InterceptorSet>>,
}

impl SessionCaches {
    fn new() -> Self {
        Self {
            theme_configs: SlotCache::new(),
            module_configs: SlotCache::new(),
            module_base: SlotCache::new(),
            component_indexes: SlotCache::new(),
            persisted_indexes: SlotCache::new(),
            declared_advice: SlotCache::new(),
            interceptors: SlotCache::new(),
        }
    }
}

/// State shared by every resolver call of one build.
///
/// All caches are keyed by theme name and live exactly as long as the
/// session. Sessions are `Sync`; resolvers may be called from several
/// threads at once.
pub struct BuildSession {
    catalog: Catalog,
    options: SessionOptions,
    loader: Arc<dyn ModuleLoader>,
    diagnostics: Diagnostics,
    pub(crate) caches: SessionCaches,
}

impl BuildSession {
    /// Session with default options and an empty [`StaticLoader`].
    pub fn new(catalog: Catalog) -> Self {
        Self::with_loader(catalog, Arc::new(StaticLoader::new()))
    }

    pub fn with_loader(catalog: Catalog, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            catalog,
            options: SessionOptions::default(),
            loader,
            diagnostics: Diagnostics::new(),
            caches: SessionCaches::new(),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn loader(&self) -> &dyn ModuleLoader {
        self.loader.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Snapshot of diagnostics recorded so far.
    pub fn diagnostic_log(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    /// `<precompiled_dir>/<theme>`
    pub fn precompiled_theme_dir(&self, theme: &str) -> PathBuf {
        self.options.precompiled_dir.join(theme)
    }

    pub(crate) fn precompiled_dir(&self) -> &Path {
        &self.options.precompiled_dir
    }
}

impl std::fmt::Debug for BuildSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildSession")
            .field("options", &self.options)
            .field("modules", &self.catalog.modules().len())
            .field("themes", &self.catalog.themes().len())
            .finish_non_exhaustive()
    }
}
