//! Config file loading with provenance.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// A config file that contributed to a resolved config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    /// File path
    pub path: PathBuf,

    /// SHA-256 digest of raw file bytes
    pub digest: String,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Load a `.json` or `.toml` config file.
///
/// The document root must be a table/object.
pub fn load_config_file(path: &Path) -> Result<(Value, ConfigSource), ConfigError> {
    let bytes =
        fs::read(path).map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str::<Value>(&contents).map_err(|e| {
            ConfigError::ParseError(format!("{}: JSON parse error: {}", path.display(), e))
        })?,
        Some("toml") => {
            let toml_value: toml::Value = toml::from_str(&contents).map_err(|e| {
                ConfigError::ParseError(format!("{}: TOML parse error: {}", path.display(), e))
            })?;
            toml_to_json(toml_value)
        }
        _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    };

    if !value.is_object() {
        return Err(ConfigError::ParseError(format!(
            "{}: config root must be an object",
            path.display()
        )));
    }

    Ok((
        value,
        ConfigSource {
            path: path.to_path_buf(),
            digest,
        },
    ))
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
