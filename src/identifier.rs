//! `Module::relative/path` identifiers.
//!
//! `Vendor_Module::js/util` resolves to index key `Vendor_Module/js/util`;
//! `Theme::components/Header.vue` resolves against the theme's own web root.
//! A trailing extension is dropped before lookup, but only component
//! extensions can ever match.

use std::path::Path;

use crate::catalog::COMPONENT_EXTENSIONS;
use crate::index::ComponentIndex;

/// Separator between module name and relative path.
pub const IDENTIFIER_SEPARATOR: &str = "::";

/// A parsed identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'a> {
    pub module: &'a str,
    pub path: &'a str,
}

impl<'a> Identifier<'a> {
    /// Split on the first `::`. Both halves must be non-empty.
    pub fn parse(identifier: &'a str) -> Option<Self> {
        let (module, path) = identifier.split_once(IDENTIFIER_SEPARATOR)?;
        if module.is_empty() || path.is_empty() {
            return None;
        }
        Some(Self { module, path })
    }

    /// Extension of the last path segment, if any.
    pub fn extension(&self) -> Option<&'a str> {
        split_extension(self.path).1
    }

    /// `<module>/<path without extension>`
    pub fn index_key(&self) -> String {
        format!("{}/{}", self.module, split_extension(self.path).0)
    }

    fn has_indexable_extension(&self) -> bool {
        self.extension()
            .map_or(true, |ext| COMPONENT_EXTENSIONS.contains(&ext))
    }
}

fn split_extension(path: &str) -> (&str, Option<&str>) {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let at = name_start + dot;
            (&path[..at], Some(&path[at + 1..]))
        }
        _ => (path, None),
    }
}

/// Exact lookup of `identifier` in `index`.
pub fn resolve<'i>(index: &'i ComponentIndex, identifier: &str) -> Option<&'i Path> {
    let parsed = Identifier::parse(identifier)?;
    if !parsed.has_indexable_extension() {
        return None;
    }
    index.get(&parsed.index_key()).map(|p| p.as_path())
}

/// Import-style lookup.
///
/// Paths outside the components and scripts folders are taken to be
/// relative to the components folder, so `Vendor_Module::Header.vue` means
/// `Vendor_Module::components/Header.vue`.
pub fn resolve_import<'i>(
    index: &'i ComponentIndex,
    identifier: &str,
    components_folder: &str,
    scripts_folder: &str,
) -> Option<&'i Path> {
    let parsed = Identifier::parse(identifier)?;
    let in_folder = |folder: &str| {
        parsed
            .path
            .strip_prefix(folder)
            .is_some_and(|rest| rest.starts_with('/'))
    };

    if in_folder(components_folder) || in_folder(scripts_folder) {
        return resolve(index, identifier);
    }

    let prefixed = format!(
        "{}{}{}/{}",
        parsed.module, IDENTIFIER_SEPARATOR, components_folder, parsed.path
    );
    resolve(index, &prefixed)
}
