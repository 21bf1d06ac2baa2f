//! Source text for generated interceptor modules.
//!
//! The generated module imports the original under `?original` so the
//! bundler does not substitute it again, registers the same advice with the
//! same arguments as the build did, and re-exports every original export
//! through the wrapper.

use std::fmt::Write;
use std::path::Path;

use serde_json::Value;
use themeweave_intercept::method_key;

use super::ResolvedAdvice;
use crate::session::SessionOptions;

/// Query suffix marking the bypass import of an intercepted file.
pub const ORIGINAL_QUERY: &str = "original";

const DEFAULT_EXPORT: &str = "default";

/// JSON string literal, which is also a valid JS string literal.
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn fs_import(options: &SessionOptions, path: &Path) -> String {
    format!("{}{}", options.fs_prefix, path.display())
}

/// Render the interceptor module for `target`.
pub fn generate_source(
    options: &SessionOptions,
    target: &str,
    target_path: &Path,
    advice: &[ResolvedAdvice],
    target_exports: &[&str],
    methods: &[String],
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "import registry from {};", js_string(&options.runtime_import));
    let _ = writeln!(
        out,
        "import * as originalModule from {};",
        js_string(&format!("{}?{}", fs_import(options, target_path), ORIGINAL_QUERY))
    );
    for (i, resolved) in advice.iter().enumerate() {
        let _ = writeln!(
            out,
            "import * as advice_{} from {};",
            i,
            js_string(&fs_import(options, &resolved.path))
        );
    }
    out.push('\n');

    for (i, resolved) in advice.iter().enumerate() {
        for method in &resolved.methods {
            let _ = writeln!(
                out,
                "registry.addAdvice({}, {}, {}, advice_{}[{}], {});",
                js_string(&method_key(target, &method.target_method)),
                js_string(&resolved.declaration.name),
                js_string(method.kind.as_str()),
                i,
                js_string(&method.export_name),
                resolved.declaration.sort_order
            );
        }
    }
    out.push('\n');

    let method_list = methods
        .iter()
        .map(|m| js_string(m))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(
        out,
        "const wrapper = registry.wrap({{ ...originalModule }}, {}, [{}]);",
        js_string(target),
        method_list
    );
    out.push('\n');

    for name in target_exports {
        if *name == DEFAULT_EXPORT {
            out.push_str("export default wrapper.default;\n");
        } else {
            let _ = writeln!(out, "export const {} = wrapper[{}];", name, js_string(name));
        }
    }

    out
}
