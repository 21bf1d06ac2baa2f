//! Interceptor builds.
//!
//! For each target with active declared advice, the build resolves target and
//! advice modules through the component index, matches advice exports
//! (`before*`, `around*`, `after*`) to the target's real exports, registers
//! the matches in a registry owned by the theme's interceptor set, and
//! produces a wrapper plus the source text of a module that replaces the
//! target in the bundle. The registry is only published when the whole build
//! succeeds.
//!
//! Unresolvable or unloadable files are skipped with a diagnostic. An advice
//! export naming a method the target does not export fails the whole build.

mod codegen;
mod declared;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use themeweave_intercept::{method_key, AdviceKind, InterceptedModule, InterceptionRegistry};
use tracing::{debug, info};

use crate::diagnostics::DiagnosticKind;
use crate::error::{Error, Result};
use crate::identifier;
use crate::index::{cached_component_index, component_index, ComponentIndex};
use crate::loader::LoadedModule;
use crate::session::BuildSession;

pub use codegen::{generate_source, ORIGINAL_QUERY};
pub use declared::{collect_declared_advice, AdviceDeclaration, DeclaredAdvice};

/// Advice-module export applied to a target method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdviceMethod {
    pub export_name: String,
    pub kind: AdviceKind,
    pub target_method: String,
}

/// A declaration whose advice module resolved and matched at least one method
#[derive(Debug, Clone)]
pub struct ResolvedAdvice {
    pub declaration: AdviceDeclaration,
    pub path: PathBuf,
    pub methods: Vec<AdviceMethod>,
}

/// Build output for one target
#[derive(Debug, Clone)]
pub struct Interceptor {
    /// Live wrapper over the target's exports
    pub wrapper: InterceptedModule,
    pub target_path: PathBuf,
    pub raw_module: Arc<LoadedModule>,
    pub advice: Vec<ResolvedAdvice>,
    /// Generated module source
    pub source: String,
}

impl Interceptor {
    /// Intercepted method names, in first-match order.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = Vec::new();
        for method in self.advice.iter().flat_map(|a| &a.methods) {
            if !methods.contains(&method.target_method.as_str()) {
                methods.push(&method.target_method);
            }
        }
        methods
    }
}

/// Interceptors by target identifier, in declaration order.
///
/// Targets without a single matched advice are absent. Every wrapper in the
/// set dispatches through the set's own registry.
#[derive(Debug, Default)]
pub struct InterceptorSet {
    entries: Vec<(String, Interceptor)>,
    registry: Arc<InterceptionRegistry>,
}

impl InterceptorSet {
    /// Advice registered by this theme's build.
    pub fn registry(&self) -> &Arc<InterceptionRegistry> {
        &self.registry
    }

    pub fn get(&self, target: &str) -> Option<&Interceptor> {
        self.entries
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, interceptor)| interceptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Interceptor)> {
        self.entries.iter().map(|(t, i)| (t.as_str(), i))
    }

    pub fn targets(&self) -> Vec<&str> {
        self.entries.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.get(target).is_some()
    }

    pub fn by_target_path(&self, path: &Path) -> Option<&Interceptor> {
        self.entries
            .iter()
            .map(|(_, interceptor)| interceptor)
            .find(|interceptor| interceptor.target_path == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build (or return the cached) interceptor set for `theme`.
///
/// Prefers the persisted component index and falls back to scanning when it
/// is missing.
pub fn build_interceptors(session: &BuildSession, theme: &str) -> Result<Arc<InterceptorSet>> {
    session
        .caches
        .interceptors
        .get_or_try_insert_with(theme, || build_uncached(session, theme).map(Arc::new))
}

fn build_uncached(session: &BuildSession, theme: &str) -> Result<InterceptorSet> {
    let declared = collect_declared_advice(session, theme);

    let index = match cached_component_index(session, theme) {
        Ok(index) => index,
        Err(e) => {
            session.diagnostics().warn(
                DiagnosticKind::CacheMiss,
                theme,
                format!("Persisted component index unusable ({}), rescanning", e),
            );
            component_index(session, theme)?
        }
    };

    let mut set = InterceptorSet::default();
    for (target, declarations) in declared.targets() {
        let built = build_target(session, theme, &set.registry, &index, target, declarations)?;
        if let Some(interceptor) = built {
            set.entries.push((target.to_string(), interceptor));
        }
    }

    info!(theme, targets = set.len(), "built interceptors");
    Ok(set)
}

fn build_target(
    session: &BuildSession,
    theme: &str,
    registry: &Arc<InterceptionRegistry>,
    index: &ComponentIndex,
    target: &str,
    declarations: &[AdviceDeclaration],
) -> Result<Option<Interceptor>> {
    let diagnostics = session.diagnostics();

    let Some(target_path) = identifier::resolve(index, target) else {
        diagnostics.warn(
            DiagnosticKind::UnresolvedTarget,
            theme,
            format!("Target module not found for identifier: {}", target),
        );
        return Ok(None);
    };

    let raw_module = match session.loader().load(target_path) {
        Ok(module) => module,
        Err(e) => {
            diagnostics.warn(
                DiagnosticKind::LoadFailed,
                theme,
                format!("Failed to load target {}: {}", target, e),
            );
            return Ok(None);
        }
    };

    let mut methods: Vec<String> = Vec::new();
    let mut advice = Vec::new();

    for declaration in declarations {
        let Some(advice_path) = identifier::resolve(index, &declaration.source) else {
            diagnostics.warn(
                DiagnosticKind::UnresolvedAdvice,
                theme,
                format!("Advice module not found: {}", declaration.source),
            );
            continue;
        };

        let advice_module = match session.loader().load(advice_path) {
            Ok(module) => module,
            Err(e) => {
                diagnostics.warn(
                    DiagnosticKind::LoadFailed,
                    theme,
                    format!("Failed to load advice {}: {}", declaration.source, e),
                );
                continue;
            }
        };

        let mut matched = Vec::new();
        for (export_name, export) in advice_module.exports() {
            let Some((kind, remainder)) = classify_export(export_name) else {
                continue;
            };

            let method = match_target_method(remainder, &raw_module).ok_or_else(|| {
                Error::ExportMismatch {
                    advice: declaration.name.clone(),
                    advice_source: declaration.source.clone(),
                    export: export_name.clone(),
                    target: target.to_string(),
                    method: remainder.to_string(),
                }
            })?;

            let Some(handler) = export.as_callable() else {
                diagnostics.warn(
                    DiagnosticKind::NotCallable,
                    theme,
                    format!(
                        "Advice {} export '{}' is not a function",
                        declaration.name, export_name
                    ),
                );
                continue;
            };
            if raw_module.get(&method).is_some_and(|e| !e.is_callable()) {
                diagnostics.warn(
                    DiagnosticKind::NotCallable,
                    theme,
                    format!("Target {} export '{}' is not a function", target, method),
                );
                continue;
            }

            registry.add_advice(
                &method_key(target, &method),
                &declaration.name,
                kind.as_str(),
                handler.clone(),
                declaration.sort_order,
            )?;

            if !methods.contains(&method) {
                methods.push(method.clone());
            }
            matched.push(AdviceMethod {
                export_name: export_name.clone(),
                kind,
                target_method: method,
            });
        }

        if !matched.is_empty() {
            advice.push(ResolvedAdvice {
                declaration: declaration.clone(),
                path: advice_path.to_path_buf(),
                methods: matched,
            });
        }
    }

    if methods.is_empty() {
        debug!(theme, target, "no advice matched, target left unintercepted");
        return Ok(None);
    }

    let wrapper = registry.wrap(raw_module.exports().to_vec(), target);
    let source = generate_source(
        session.options(),
        target,
        target_path,
        &advice,
        &raw_module.export_names(),
        &methods,
    );

    Ok(Some(Interceptor {
        wrapper,
        target_path: target_path.to_path_buf(),
        raw_module,
        advice,
        source,
    }))
}

/// Split `beforeSave` into (`Before`, `Save`).
fn classify_export(export_name: &str) -> Option<(AdviceKind, &str)> {
    AdviceKind::ALL.iter().find_map(|kind| {
        export_name
            .strip_prefix(kind.as_str())
            .map(|remainder| (*kind, remainder))
    })
}

/// Exact export name first, then with the first letter lowercased.
///
/// `default` always matches so advice on a default export needs no
/// corresponding named export.
fn match_target_method(remainder: &str, target: &LoadedModule) -> Option<String> {
    if remainder == "default" || target.has_export(remainder) {
        return Some(remainder.to_string());
    }
    let lowered = lower_first(remainder);
    target.has_export(&lowered).then_some(lowered)
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
