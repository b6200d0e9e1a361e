//! Document types and parsing
//!
//! Every bundled artifact is addressed by a [`DocumentKey`] and parsed into a
//! JSON tree regardless of its on-disk format.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checksum::Checksum;
use crate::error::{RegistryError, Result};

/// On-disk format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a document name's extension
    pub fn from_name(name: &str) -> Option<Self> {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some("json") => Some(DocumentFormat::Json),
            Some("toml") => Some(DocumentFormat::Toml),
            _ => None,
        }
    }

    /// Parse text in this format into a JSON tree
    pub fn parse(&self, text: &str) -> Result<Value> {
        match self {
            DocumentFormat::Json => Ok(serde_json::from_str(text)?),
            DocumentFormat::Toml => {
                let value: toml::Value = toml::from_str(text)?;
                Ok(serde_json::to_value(value)?)
            }
        }
    }
}

/// Address of a document: `(category, version, name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey {
    pub category: String,
    pub version: String,
    /// Category-relative path with `/` separators
    pub name: String,
}

impl DocumentKey {
    pub fn new(
        category: impl Into<String>,
        version: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            version: version.into(),
            name: name.into(),
        }
    }

    /// File stem of the name's last path segment, without any `.schema`
    /// infix (e.g. `catalog/iTerm2.toml` -> `iTerm2`)
    pub fn stem(&self) -> &str {
        let file = self.name.rsplit('/').next().unwrap_or(&self.name);
        file.split_once('.').map(|(s, _)| s).unwrap_or(file)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.version, self.name)
    }
}

/// A parsed, immutable document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub key: DocumentKey,
    pub format: DocumentFormat,
    /// Parsed content
    pub content: Value,
    /// SHA256 of the raw bytes as stored
    pub checksum: Checksum,
}

impl Document {
    /// Parse raw bytes stored under `key`
    pub fn parse(key: DocumentKey, bytes: &[u8]) -> Result<Self> {
        let format = DocumentFormat::from_name(&key.name).ok_or_else(|| {
            RegistryError::invalid_document(key.to_string(), "unsupported document extension")
        })?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RegistryError::invalid_document(key.to_string(), e))?;
        let content = format
            .parse(text)
            .map_err(|e| RegistryError::invalid_document(key.to_string(), e))?;

        Ok(Self {
            checksum: Checksum::from_bytes(bytes),
            key,
            format,
            content,
        })
    }

    /// Top-level value for `field`, if the document is an object
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.content.get(field)
    }

    /// Whether the document is an object containing `field`
    pub fn contains_key(&self, field: &str) -> bool {
        self.content.as_object().is_some_and(|o| o.contains_key(field))
    }

    /// Deserialize the content into a typed value
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.content)
            .map_err(|e| RegistryError::invalid_document(self.key.to_string(), e))
    }
}

/// Result of comparing two schema documents after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaComparison {
    pub equal: bool,
    pub left: String,
    pub right: String,
}

/// Convert JSON or TOML schema text into canonical, pretty-printed JSON
/// with object keys sorted at every level.
pub fn normalize_schema(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::EmptySchema);
    }

    let value = match DocumentFormat::Json.parse(trimmed) {
        Ok(v) => v,
        Err(json_err) => DocumentFormat::Toml.parse(trimmed).map_err(|toml_err| {
            RegistryError::invalid_document(
                "<input>",
                format!("not JSON ({json_err}) and not TOML ({toml_err})"),
            )
        })?,
    };

    Ok(serde_json::to_string_pretty(&canonicalize(value))?)
}

/// Normalize and compare two schema documents
pub fn compare_schemas(a: &str, b: &str) -> Result<SchemaComparison> {
    let left = normalize_schema(a)?;
    let right = normalize_schema(b)?;
    Ok(SchemaComparison {
        equal: left == right,
        left,
        right,
    })
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
