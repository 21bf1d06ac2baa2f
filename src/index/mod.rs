//! Component index: every `.vue`/`.js` file visible to a theme, keyed by
//! `<namespace>/<folder>/<relative path>`.
//!
//! Layers, lowest precedence first:
//! 1. module web roots, in catalog order
//! 2. for each theme from the root ancestor down to the requested theme:
//!    per-module overrides (enabled modules, in order), then the theme's own
//!    web root under the `Theme` namespace
//!
//! Later layers replace earlier entries with the same key.

mod scan;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::catalog::THEME_NAMESPACE;
use crate::error::{Error, Result};
use crate::session::BuildSession;

pub(crate) use scan::scan_web_root;

/// Component key to absolute file path
pub type ComponentIndex = BTreeMap<String, PathBuf>;

/// File name of the persisted index inside `<precompiled_dir>/<theme>/`.
pub const COMPONENT_INDEX_FILE: &str = "component-index.json";

const MODULE_BASE_KEY: &str = "";

/// Full index for `theme`. Cached per session.
///
/// An unknown theme yields the module base layer alone.
pub fn component_index(session: &BuildSession, theme: &str) -> Result<Arc<ComponentIndex>> {
    session
        .caches
        .component_indexes
        .get_or_try_insert_with(theme, || {
            let mut index = module_base_layer(session)?.as_ref().clone();
            index.extend(theme_layers(session, theme)?);
            debug!(theme, entries = index.len(), "built component index");
            Ok(Arc::new(index))
        })
}

/// Module web roots only. Independent of theme; computed once per session.
pub fn module_base_layer(session: &BuildSession) -> Result<Arc<ComponentIndex>> {
    session
        .caches
        .module_base
        .get_or_try_insert_with(MODULE_BASE_KEY, || {
            let catalog = session.catalog();
            let folders = catalog.component_folders();

            let layers = catalog
                .modules()
                .par_iter()
                .map(|module| scan_web_root(&module.name, &module.web_root(), &folders))
                .collect::<Result<Vec<_>>>()?;

            let mut index = ComponentIndex::new();
            for layer in layers {
                index.extend(layer);
            }
            Ok(Arc::new(index))
        })
}

fn theme_layers(session: &BuildSession, theme: &str) -> Result<ComponentIndex> {
    let catalog = session.catalog();
    let Some(definition) = catalog.theme(theme) else {
        return Ok(ComponentIndex::new());
    };

    let mut index = match definition.parent.as_deref() {
        Some(parent) => theme_layers(session, parent)?,
        None => ComponentIndex::new(),
    };

    let folders = catalog.component_folders();
    let overrides = catalog
        .enabled_modules()
        .par_iter()
        .map(|module| scan_web_root(module, &definition.module_web_root(module), &folders))
        .collect::<Result<Vec<_>>>()?;
    for layer in overrides {
        index.extend(layer);
    }

    index.extend(scan_web_root(
        THEME_NAMESPACE,
        &definition.web_root(),
        &folders,
    )?);
    Ok(index)
}

/// `<precompiled_dir>/<theme>/component-index.json`
pub fn persisted_index_path(session: &BuildSession, theme: &str) -> PathBuf {
    session
        .precompiled_dir()
        .join(theme)
        .join(COMPONENT_INDEX_FILE)
}

/// Compute the index for `theme` and persist it for later builds.
pub fn write_component_index(session: &BuildSession, theme: &str) -> Result<PathBuf> {
    let index = component_index(session, theme)?;
    let path = persisted_index_path(session, theme);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(index.as_ref())?;
    fs::write(&path, json)?;

    info!(theme, path = %path.display(), entries = index.len(), "wrote component index");
    Ok(path)
}

/// Index for `theme` read from its persisted artifact. Cached per session.
///
/// Fails with [`Error::MissingIndexArtifact`] when nothing was persisted.
pub fn cached_component_index(session: &BuildSession, theme: &str) -> Result<Arc<ComponentIndex>> {
    session
        .caches
        .persisted_indexes
        .get_or_try_insert_with(theme, || {
            let path = persisted_index_path(session, theme);
            read_index(&path).map(Arc::new)
        })
}

fn read_index(path: &Path) -> Result<ComponentIndex> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::MissingIndexArtifact(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&contents)?)
}
