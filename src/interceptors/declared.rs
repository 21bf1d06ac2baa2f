//! Declared advice collection.
//!
//! Declarations come from the merged module config, either at the top level
//! (`"interceptors": [...]`) or scoped under a module key
//! (`"Vendor_Module": {"interceptors": [...]}`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use themeweave_intercept::DEFAULT_SORT_ORDER;
use tracing::debug;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::module_config::merged_module_config;
use crate::session::BuildSession;
use crate::theme::theme_config;

const INTERCEPTORS_KEY: &str = "interceptors";

fn default_sort_order() -> i64 {
    DEFAULT_SORT_ORDER
}

fn default_active() -> bool {
    true
}

/// One declared advice after name-level deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceDeclaration {
    pub name: String,

    /// Target identifier
    pub target: String,

    /// Advice module identifier
    #[serde(alias = "plugin")]
    pub source: String,

    #[serde(default = "default_sort_order")]
    pub sort_order: i64,

    #[serde(default = "default_active")]
    pub active: bool,

    /// Module whose config first declared this advice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

/// Active declarations grouped by target, each group sorted by sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredAdvice {
    targets: Vec<(String, Vec<AdviceDeclaration>)>,
}

impl DeclaredAdvice {
    /// Targets in first-declaration order.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &[AdviceDeclaration])> {
        self.targets
            .iter()
            .map(|(target, decls)| (target.as_str(), decls.as_slice()))
    }

    pub fn for_target(&self, target: &str) -> Option<&[AdviceDeclaration]> {
        self.targets
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, decls)| decls.as_slice())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Group, dedupe, filter and sort the declarations in `merged_config`.
    ///
    /// A later entry with an already-seen name for the same target
    /// shallow-overrides the earlier one. Entries that still lack a usable
    /// `source` afterwards are reported and dropped.
    pub fn from_config(merged_config: &Value, diagnostics: &Diagnostics, theme: &str) -> Self {
        let mut grouped: Vec<(String, Vec<(String, Map<String, Value>)>)> = Vec::new();

        for (module, entry) in raw_entries(merged_config) {
            let (Some(name), Some(target)) = (
                entry.get("name").and_then(Value::as_str),
                entry.get("target").and_then(Value::as_str),
            ) else {
                continue;
            };
            let (name, target) = (name.to_string(), target.to_string());

            let group = match grouped.iter().position(|(t, _)| *t == target) {
                Some(i) => &mut grouped[i].1,
                None => {
                    grouped.push((target, Vec::new()));
                    let last = grouped.len() - 1;
                    &mut grouped[last].1
                }
            };

            match group.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => {
                    for (key, value) in entry {
                        existing.insert(key.clone(), value.clone());
                    }
                }
                None => {
                    let mut fields = entry.clone();
                    if let Some(module) = module {
                        fields.insert("module".to_string(), Value::String(module.to_string()));
                    }
                    group.push((name, fields));
                }
            }
        }

        let mut targets = Vec::new();
        for (target, entries) in grouped {
            let mut declarations: Vec<AdviceDeclaration> = entries
                .into_iter()
                .filter_map(|(name, fields)| {
                    match serde_json::from_value::<AdviceDeclaration>(Value::Object(fields)) {
                        Ok(decl) => Some(decl),
                        Err(e) => {
                            diagnostics.warn(
                                DiagnosticKind::InvalidDeclaration,
                                theme,
                                format!("Ignoring advice {} on {}: {}", name, target, e),
                            );
                            None
                        }
                    }
                })
                .filter(|decl| decl.active)
                .collect();
            declarations.sort_by_key(|decl| decl.sort_order);

            if !declarations.is_empty() {
                targets.push((target, declarations));
            }
        }

        Self { targets }
    }
}

/// Declaration objects in document order, tagged with their module scope.
fn raw_entries(config: &Value) -> Vec<(Option<&str>, &Map<String, Value>)> {
    let Some(root) = config.as_object() else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (key, value) in root {
        let (module, list) = if key == INTERCEPTORS_KEY {
            (None, value.as_array())
        } else {
            (
                Some(key.as_str()),
                value.get(INTERCEPTORS_KEY).and_then(Value::as_array),
            )
        };
        for item in list.into_iter().flatten() {
            if let Some(object) = item.as_object() {
                entries.push((module, object));
            }
        }
    }
    entries
}

/// Declared advice for `theme`. Cached per session.
///
/// An unresolvable theme config yields an empty set.
pub fn collect_declared_advice(session: &BuildSession, theme: &str) -> Arc<DeclaredAdvice> {
    session
        .caches
        .declared_advice
        .get_or_insert_with(theme, || {
            let theme_config = theme_config(session, theme);
            let Some(merged) = merged_module_config(session, theme, theme_config.as_deref()) else {
                return Arc::new(DeclaredAdvice::default());
            };
            let declared = DeclaredAdvice::from_config(&merged, session.diagnostics(), theme);
            debug!(theme, targets = declared.len(), "collected declared advice");
            Arc::new(declared)
        })
}
