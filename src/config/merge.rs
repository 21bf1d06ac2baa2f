//! Config cascade merge
//!
//! - Objects: deep-merge by key
//! - Arrays: CONCATENATE (base entries first)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge two JSON values.
///
/// Merge semantics:
/// - Objects: deep-merge by key (recursive)
/// - Arrays: base elements followed by overlay elements
/// - Scalars: override (second wins)
/// - Null: override (null can override any value)
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Interceptor declarations and content patterns accumulate
        (Value::Array(mut base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items);
            Value::Array(base_items)
        }

        (_, overlay) => overlay,
    }
}

/// Merge config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers
        .into_iter()
        .fold(Value::Object(Default::default()), deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let base = json!({"inheritParentStyles": true});
        let overlay = json!({"inheritParentStyles": false});
        let result = deep_merge(base, overlay);
        assert_eq!(result["inheritParentStyles"], false);
    }

    #[test]
    fn test_object_deep_merge() {
        let base = json!({
            "style": {
                "content": [],
                "theme": {"colors": {"primary": "red"}}
            }
        });
        let overlay = json!({
            "style": {
                "theme": {"colors": {"secondary": "blue"}}
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["style"]["theme"]["colors"]["primary"], "red");
        assert_eq!(result["style"]["theme"]["colors"]["secondary"], "blue");
        assert!(result["style"]["content"].is_array());
    }

    #[test]
    fn test_array_concatenate() {
        let base = json!({
            "interceptors": [{"name": "A"}]
        });
        let overlay = json!({
            "interceptors": [{"name": "B"}, {"name": "C"}]
        });
        let result = deep_merge(base, overlay);

        let names: Vec<&str> = result["interceptors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_array_over_scalar_replaces() {
        let base = json!({"ignoredModuleConfig": "all"});
        let overlay = json!({"ignoredModuleConfig": ["Vendor_A"]});
        let result = deep_merge(base, overlay);

        assert_eq!(result["ignoredModuleConfig"], json!(["Vendor_A"]));
    }

    #[test]
    fn test_null_override() {
        let base = json!({"value": 100});
        let overlay = json!({"value": null});
        let result = deep_merge(base, overlay);

        assert!(result["value"].is_null());
    }

    #[test]
    fn test_merge_layers() {
        let module_a = json!({
            "style": {"content": ["/a/**/*.vue"]},
            "interceptors": [{"name": "A"}]
        });
        let module_b = json!({
            "style": {"content": ["/b/**/*.vue"]}
        });
        let module_c = json!({
            "interceptors": [{"name": "C"}]
        });

        let result = merge_layers(vec![module_a, module_b, module_c]);

        assert_eq!(result["style"]["content"], json!(["/a/**/*.vue", "/b/**/*.vue"]));
        assert_eq!(result["interceptors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_merge_layers_empty() {
        assert_eq!(merge_layers(vec![]), json!({}));
    }
}
