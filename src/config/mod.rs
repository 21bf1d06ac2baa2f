//! Config cascade
//!
//! Theme and module configs are JSON or TOML documents merged with
//! [`deep_merge`]. Paths in `style.content` are rebased onto the web root of
//! whatever declared them.

mod loader;
mod merge;

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

pub use loader::{load_config_file, ConfigError, ConfigSource};
pub use merge::{deep_merge, merge_layers};

/// Rewrite relative entries of `style.content` to absolute paths under `root`.
pub(crate) fn rebase_content_patterns(config: &mut Value, root: &Path) {
    let Some(patterns) = config
        .pointer_mut("/style/content")
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for pattern in patterns.iter_mut() {
        if let Value::String(p) = pattern {
            if !Path::new(p.as_str()).is_absolute() {
                *p = normalize(&root.join(p.as_str())).to_string_lossy().into_owned();
            }
        }
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
