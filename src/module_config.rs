//! Theme-aware module files and the merged module config.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{deep_merge, load_config_file, rebase_content_patterns};
use crate::diagnostics::DiagnosticKind;
use crate::session::BuildSession;
use crate::theme::ThemeConfig;

/// Locate `<theme src>/<module>/web/<file>`, walking up the parent chain
/// when `allow_parent_fallback` is set.
pub fn resolve_file_by_theme(
    session: &BuildSession,
    theme: &str,
    module: &str,
    file: &str,
    allow_parent_fallback: bool,
) -> Option<PathBuf> {
    let catalog = session.catalog();
    let mut current = catalog.theme(theme);

    while let Some(definition) = current {
        let candidate = definition.module_web_root(module).join(file);
        if candidate.exists() {
            return Some(candidate);
        }
        if !allow_parent_fallback {
            break;
        }
        current = definition.parent.as_deref().and_then(|p| catalog.theme(p));
    }
    None
}

/// Every enabled module's config merged in enabled order. Cached per theme.
///
/// A theme override of a module's config file wins over the module's own
/// file, which wins over inline catalog config. Modules named by the theme's
/// `ignoredModuleConfig` (or all of them, for `"all"`) contribute an empty
/// `style` section. Returns `None` when no theme config is given and nothing
/// is cached yet.
pub fn merged_module_config(
    session: &BuildSession,
    theme: &str,
    theme_config: Option<&ThemeConfig>,
) -> Option<Arc<Value>> {
    if let Some(cached) = session.caches.module_configs.get(theme) {
        return cached;
    }
    let theme_config = theme_config?;

    session.caches.module_configs.get_or_insert_with(theme, || {
        Some(Arc::new(merge_module_configs(session, theme, theme_config)))
    })
}

fn merge_module_configs(session: &BuildSession, theme: &str, theme_config: &ThemeConfig) -> Value {
    let ignored = theme_config.ignored_module_config();
    let inherit = theme_config.inherit_parent_config();
    let mut merged = Value::Object(Map::new());

    for module in session.catalog().enabled_modules() {
        let Some(mut config) = load_module_config(session, theme, module, inherit) else {
            continue;
        };

        if ignored.contains(module) {
            if let Value::Object(map) = &mut config {
                map.insert("style".to_string(), Value::Object(Map::new()));
            }
        } else if let Some(definition) = session.catalog().module(module) {
            rebase_content_patterns(&mut config, &definition.web_root());
        }

        merged = deep_merge(merged, config);
    }

    debug!(theme, "merged module configs");
    merged
}

fn load_module_config(
    session: &BuildSession,
    theme: &str,
    module: &str,
    allow_parent_fallback: bool,
) -> Option<Value> {
    let catalog = session.catalog();
    let file = &catalog.module_config_file;
    let definition = catalog.module(module);

    let path = resolve_file_by_theme(session, theme, module, file, allow_parent_fallback)
        .or_else(|| {
            definition
                .map(|d| d.web_root().join(file))
                .filter(|p| p.exists())
        });

    match path {
        Some(path) => match load_config_file(&path) {
            Ok((value, _)) => Some(value),
            Err(e) => {
                session.diagnostics().warn(
                    DiagnosticKind::ConfigLoad,
                    theme,
                    format!("Failed to load config for module {}: {}", module, e),
                );
                None
            }
        },
        None => definition
            .and_then(|d| d.config.clone())
            .filter(Value::is_object),
    }
}
