//! Web root scanning.

use std::path::Path;

use walkdir::WalkDir;

use super::ComponentIndex;
use crate::catalog::COMPONENT_EXTENSIONS;
use crate::error::{Error, Result};

/// Index the component folders under one web root.
///
/// Keys are `<namespace>/<folder>/<relative path without extension>`.
/// Missing folders contribute nothing. A key produced twice within the same
/// root is an error.
pub(crate) fn scan_web_root(
    namespace: &str,
    web_root: &Path,
    folders: &[&str],
) -> Result<ComponentIndex> {
    let mut index = ComponentIndex::new();

    for folder in folders {
        let dir = web_root.join(folder);
        if !dir.is_dir() {
            continue;
        }

        for entry in WalkDir::new(&dir)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let indexed = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| COMPONENT_EXTENSIONS.contains(&ext));
            if !indexed {
                continue;
            }

            let Ok(rel_path) = path.strip_prefix(&dir) else {
                continue;
            };
            let key = format!("{}/{}/{}", namespace, folder, key_path(rel_path));

            if index.contains_key(&key) {
                return Err(Error::DuplicateComponentKey {
                    key,
                    path: path.to_path_buf(),
                });
            }
            index.insert(key, path.to_path_buf());
        }
    }

    Ok(index)
}

/// Relative path with its extension dropped, `/`-separated.
fn key_path(rel_path: &Path) -> String {
    rel_path
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
