//! Module and theme catalog.
//!
//! The catalog is produced by an external config generator and read once per
//! build. It names every module and theme, their source roots, theme parents,
//! and which modules are enabled.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Web root of a module, relative to its source root.
pub const MODULE_WEB_PATH: &str = "view/frontend/web";

/// Web root of a theme (and of a module override inside a theme).
pub const THEME_WEB_PATH: &str = "web";

/// Key namespace for files in a theme's own web root.
pub const THEME_NAMESPACE: &str = "Theme";

/// Extensions that are indexed as components.
pub const COMPONENT_EXTENSIONS: &[&str] = &["vue", "js"];

const DEFAULT_THEME_CONFIG_FILE: &str = "theme.config.json";
const DEFAULT_MODULE_CONFIG_FILE: &str = "module.config.json";
const DEFAULT_COMPONENTS_FOLDER: &str = "components";
const DEFAULT_SCRIPTS_FOLDER: &str = "js";

/// Catalog errors. Any of these is fatal to the build.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Theme inheritance cycle through \"{0}\"")]
    ThemeCycle(String),
}

/// A module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    #[serde(skip)]
    pub name: String,

    /// Source root
    pub src: PathBuf,

    /// Config used when no config file exists for the module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl ModuleDefinition {
    pub fn new(name: impl Into<String>, src: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            config: None,
        }
    }

    /// `<src>/view/frontend/web`
    pub fn web_root(&self) -> PathBuf {
        self.src.join(MODULE_WEB_PATH)
    }
}

/// A theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeDefinition {
    #[serde(skip)]
    pub name: String,

    /// Source root
    pub src: PathBuf,

    /// Parent theme name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Config used when the theme has no config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl ThemeDefinition {
    pub fn new(name: impl Into<String>, src: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            parent: None,
            config: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// `<src>/web`
    pub fn web_root(&self) -> PathBuf {
        self.src.join(THEME_WEB_PATH)
    }

    /// `<src>/<module>/web`
    pub fn module_web_root(&self, module: &str) -> PathBuf {
        self.src.join(module).join(THEME_WEB_PATH)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog {
    #[serde(default)]
    modules: Map<String, Value>,
    #[serde(default)]
    themes: Map<String, Value>,
    #[serde(default)]
    enabled_modules: Option<Vec<String>>,
    #[serde(default)]
    theme_config_file: Option<String>,
    #[serde(default)]
    module_config_file: Option<String>,
    #[serde(default)]
    components_folder: Option<String>,
    #[serde(default)]
    scripts_folder: Option<String>,
}

/// The static module/theme catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    modules: Vec<ModuleDefinition>,
    themes: Vec<ThemeDefinition>,
    enabled_modules: Vec<String>,

    /// Theme config file name, inside the theme web root
    pub theme_config_file: String,

    /// Module config file name, inside the module web root
    pub module_config_file: String,

    /// Folder holding single-file components and their scripts
    pub components_folder: String,

    /// Folder holding plain scripts
    pub scripts_folder: String,
}

impl Catalog {
    /// Build a catalog from definitions; every module is enabled.
    pub fn new(
        modules: Vec<ModuleDefinition>,
        themes: Vec<ThemeDefinition>,
    ) -> Result<Self, CatalogError> {
        let enabled_modules = modules.iter().map(|m| m.name.clone()).collect();
        let catalog = Self {
            modules,
            themes,
            enabled_modules,
            theme_config_file: DEFAULT_THEME_CONFIG_FILE.to_string(),
            module_config_file: DEFAULT_MODULE_CONFIG_FILE.to_string(),
            components_folder: DEFAULT_COMPONENTS_FOLDER.to_string(),
            scripts_folder: DEFAULT_SCRIPTS_FOLDER.to_string(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Restrict the enabled module list (order is significant).
    pub fn with_enabled_modules(mut self, enabled: Vec<String>) -> Self {
        self.enabled_modules = enabled;
        self
    }

    /// Load a catalog JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CatalogError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    /// Parse a catalog JSON document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))?;

        let modules = raw
            .modules
            .into_iter()
            .map(|(name, value)| {
                let mut module: ModuleDefinition = serde_json::from_value(value)
                    .map_err(|e| CatalogError::ParseError(format!("module \"{}\": {}", name, e)))?;
                module.name = name;
                Ok(module)
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let themes = raw
            .themes
            .into_iter()
            .map(|(name, value)| {
                let mut theme: ThemeDefinition = serde_json::from_value(value)
                    .map_err(|e| CatalogError::ParseError(format!("theme \"{}\": {}", name, e)))?;
                theme.name = name;
                Ok(theme)
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let mut catalog = Self::new(modules, themes)?;
        if let Some(enabled) = raw.enabled_modules {
            catalog.enabled_modules = enabled;
        }
        if let Some(file) = raw.theme_config_file {
            catalog.theme_config_file = file;
        }
        if let Some(file) = raw.module_config_file {
            catalog.module_config_file = file;
        }
        if let Some(folder) = raw.components_folder {
            catalog.components_folder = folder;
        }
        if let Some(folder) = raw.scripts_folder {
            catalog.scripts_folder = folder;
        }
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for theme in &self.themes {
            let mut seen = HashSet::new();
            let mut current = Some(theme);
            while let Some(t) = current {
                if !seen.insert(t.name.as_str()) {
                    return Err(CatalogError::ThemeCycle(theme.name.clone()));
                }
                current = t.parent.as_deref().and_then(|p| self.theme(p));
            }
        }
        Ok(())
    }

    /// All modules, in declaration order.
    pub fn modules(&self) -> &[ModuleDefinition] {
        &self.modules
    }

    /// All themes, in declaration order.
    pub fn themes(&self) -> &[ThemeDefinition] {
        &self.themes
    }

    /// Enabled module names, in merge order.
    pub fn enabled_modules(&self) -> &[String] {
        &self.enabled_modules
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn theme(&self, name: &str) -> Option<&ThemeDefinition> {
        self.themes.iter().find(|t| t.name == name)
    }

    /// The theme and its ancestors, nearest first. Empty for unknown themes.
    pub fn theme_chain(&self, name: &str) -> Vec<&ThemeDefinition> {
        let mut chain = Vec::new();
        let mut current = self.theme(name);
        while let Some(theme) = current {
            chain.push(theme);
            current = theme.parent.as_deref().and_then(|p| self.theme(p));
        }
        chain
    }

    /// Component folders scanned under every web root.
    pub fn component_folders(&self) -> [&str; 2] {
        [&self.components_folder, &self.scripts_folder]
    }
}
