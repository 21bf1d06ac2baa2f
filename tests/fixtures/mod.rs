//! Test fixtures: throwaway module/theme trees on disk.
//!
//! Layout under the temp root:
//! - `app/code/<Module>/view/frontend/web/...` for modules
//! - `design/<Theme>/...` for themes (`web/` for the theme root,
//!   `<Module>/web/` for module overrides)
//! - `.precompiled/` for persisted artifacts

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;
use themeweave::{BuildSession, Catalog, ModuleDefinition, ModuleLoader, SessionOptions, ThemeDefinition};

pub struct Scenario {
    dir: TempDir,
    modules: Vec<ModuleDefinition>,
    themes: Vec<ThemeDefinition>,
    enabled: Option<Vec<String>>,
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
            modules: Vec::new(),
            themes: Vec::new(),
            enabled: None,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Register a module rooted at `app/code/<name>`.
    pub fn add_module(&mut self, name: &str) -> PathBuf {
        let src = self.root().join("app/code").join(name);
        fs::create_dir_all(&src).expect("create module dir");
        self.modules.push(ModuleDefinition::new(name, &src));
        src
    }

    /// Register a theme rooted at `design/<name>` with an empty config file.
    pub fn add_theme(&mut self, name: &str, parent: Option<&str>) -> PathBuf {
        let src = self.root().join("design").join(name);
        let mut theme = ThemeDefinition::new(name, &src);
        if let Some(parent) = parent {
            theme = theme.with_parent(parent);
        }
        self.themes.push(theme);
        self.theme_file(name, "web/theme.config.json", "{}");
        src
    }

    pub fn set_enabled(&mut self, modules: &[&str]) {
        self.enabled = Some(modules.iter().map(|m| m.to_string()).collect());
    }

    /// Write `<module web root>/<rel>`.
    pub fn module_file(&self, module: &str, rel: &str, contents: &str) -> PathBuf {
        let path = self
            .root()
            .join("app/code")
            .join(module)
            .join("view/frontend/web")
            .join(rel);
        write(&path, contents)
    }

    /// Write `<theme src>/<rel>`.
    pub fn theme_file(&self, theme: &str, rel: &str, contents: &str) -> PathBuf {
        let path = self.root().join("design").join(theme).join(rel);
        write(&path, contents)
    }

    pub fn theme_config(&self, theme: &str, config: &Value) -> PathBuf {
        self.theme_file(theme, "web/theme.config.json", &config.to_string())
    }

    pub fn module_config(&self, module: &str, config: &Value) -> PathBuf {
        self.module_file(module, "module.config.json", &config.to_string())
    }

    pub fn catalog(&self) -> Catalog {
        let catalog = Catalog::new(self.modules.clone(), self.themes.clone()).expect("valid catalog");
        match &self.enabled {
            Some(enabled) => catalog.with_enabled_modules(enabled.clone()),
            None => catalog,
        }
    }

    pub fn options(&self) -> SessionOptions {
        SessionOptions::default().with_precompiled_dir(self.root().join(".precompiled"))
    }

    pub fn session(&self) -> BuildSession {
        BuildSession::new(self.catalog()).with_options(self.options())
    }

    pub fn session_with_loader(&self, loader: Arc<dyn ModuleLoader>) -> BuildSession {
        BuildSession::with_loader(self.catalog(), loader).with_options(self.options())
    }
}

fn write(path: &Path, contents: &str) -> PathBuf {
    fs::create_dir_all(path.parent().expect("file has parent")).expect("create parent dirs");
    fs::write(path, contents).expect("write fixture file");
    path.to_path_buf()
}
