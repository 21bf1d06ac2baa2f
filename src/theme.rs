//! Theme configuration resolution.
//!
//! A theme's config is its own file (or inline catalog config) with defaults
//! applied and `style.content` rebased onto the theme web root, deep-merged
//! over the parent's resolved config unless `inheritParentConfig` is false.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::catalog::ThemeDefinition;
use crate::config::{deep_merge, load_config_file, rebase_content_patterns, ConfigSource};
use crate::diagnostics::DiagnosticKind;
use crate::session::BuildSession;

/// Modules whose config a theme ignores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreList {
    All,
    Modules(Vec<String>),
}

impl IgnoreList {
    pub fn contains(&self, module: &str) -> bool {
        match self {
            Self::All => true,
            Self::Modules(modules) => modules.iter().any(|m| m == module),
        }
    }
}

/// A theme's fully merged configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeConfig {
    theme: String,
    config: Value,
    sources: Vec<ConfigSource>,
}

impl ThemeConfig {
    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn value(&self) -> &Value {
        &self.config
    }

    /// Config files that contributed, root ancestor first.
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }

    pub fn inherit_parent_config(&self) -> bool {
        self.get_bool("inheritParentConfig").unwrap_or(true)
    }

    pub fn inherit_parent_styles(&self) -> bool {
        self.get_bool("inheritParentStyles").unwrap_or(true)
    }

    pub fn ignored_module_config(&self) -> IgnoreList {
        ignore_list(self.get("ignoredModuleConfig"))
    }

    pub fn ignored_styles_from_modules(&self) -> IgnoreList {
        ignore_list(self.get("ignoredStylesFromModules"))
    }

    pub fn exposed_packages(&self) -> Vec<&str> {
        string_list(self.get("exposedPackages"))
    }

    /// Absolute `style.content` patterns.
    pub fn content_patterns(&self) -> Vec<&str> {
        string_list(self.get("style.content"))
    }
}

fn ignore_list(value: Option<&Value>) -> IgnoreList {
    match value {
        Some(Value::String(s)) if s == "all" => IgnoreList::All,
        Some(Value::Array(items)) => IgnoreList::Modules(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => IgnoreList::Modules(Vec::new()),
    }
}

fn string_list(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Resolved config for `theme`, or `None` when the theme is unknown or its
/// config cannot be read. Cached per session.
pub fn theme_config(session: &BuildSession, theme: &str) -> Option<Arc<ThemeConfig>> {
    session
        .caches
        .theme_configs
        .get_or_insert_with(theme, || resolve_theme_config(session, theme).map(Arc::new))
}

fn resolve_theme_config(session: &BuildSession, theme: &str) -> Option<ThemeConfig> {
    let definition = session.catalog().theme(theme)?;
    let (mut config, own_source) = load_own_config(session, definition)?;

    apply_defaults(&mut config);
    rebase_content_patterns(&mut config, &definition.web_root());

    let mut sources = Vec::new();
    let inherit = config
        .get("inheritParentConfig")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    if inherit {
        if let Some(parent) = definition.parent.as_deref() {
            let base = match theme_config(session, parent) {
                Some(parent_config) => {
                    sources.extend(parent_config.sources.iter().cloned());
                    parent_config.config.clone()
                }
                None => Value::Object(Map::new()),
            };
            config = deep_merge(base, config);
        }
    }
    sources.extend(own_source);

    debug!(theme, sources = sources.len(), "resolved theme config");
    Some(ThemeConfig {
        theme: theme.to_string(),
        config,
        sources,
    })
}

fn load_own_config(
    session: &BuildSession,
    definition: &ThemeDefinition,
) -> Option<(Value, Option<ConfigSource>)> {
    let path = definition
        .web_root()
        .join(&session.catalog().theme_config_file);

    if path.exists() {
        return match load_config_file(&path) {
            Ok((value, source)) => Some((value, Some(source))),
            Err(e) => {
                session.diagnostics().warn(
                    DiagnosticKind::ConfigLoad,
                    &definition.name,
                    format!("Failed to load theme config: {}", e),
                );
                None
            }
        };
    }

    match &definition.config {
        Some(inline @ Value::Object(_)) => Some((inline.clone(), None)),
        _ => {
            session.diagnostics().warn(
                DiagnosticKind::ConfigLoad,
                &definition.name,
                format!("Theme config not found: {}", path.display()),
            );
            None
        }
    }
}

fn apply_defaults(config: &mut Value) {
    let Value::Object(map) = config else {
        return;
    };
    let defaults = [
        ("inheritParentConfig", json!(true)),
        ("inheritParentStyles", json!(true)),
        ("ignoredStylesFromModules", json!([])),
        ("ignoredModuleConfig", json!([])),
        ("exposedPackages", json!([])),
        ("style", json!({})),
    ];
    for (key, value) in defaults {
        map.entry(key).or_insert(value);
    }
}
