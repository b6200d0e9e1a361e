//! Terminal Registry
//!
//! Typed access to the `terminal` catalog: one profile per terminal emulator,
//! each describing where its glyph rendering departs from the Unicode width
//! tables and how to recognise it from the environment.
//!
//! Every profile is checked against `terminal/v1.0.0/schema.json` and its
//! declared `name` must equal its catalog key (the file stem under
//! `catalog/`).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

use jsonschema::JSONSchema;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::catalog::CatalogStore;
use crate::document::Document;
use crate::error::{RegistryError, Result};

pub const TERMINAL_CATEGORY: &str = "terminal";
pub const TERMINAL_VERSION: &str = "v1.0.0";
pub const TERMINAL_SCHEMA: &str = "schema.json";
pub const CATALOG_PREFIX: &str = "catalog/";

/// Env value that only requires the variable to be set
pub const ANY_VALUE: &str = "*";

static PROFILE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.+-]*$").unwrap());

/// How to recognise a terminal from its environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Expected `TERM_PROGRAM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_program: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl DetectionConfig {
    /// `TERM_PROGRAM` matches, or every declared variable is present with
    /// the declared value (`*` accepts any value).
    pub fn matches(&self, env: &HashMap<String, String>) -> bool {
        if let (Some(expected), Some(actual)) = (&self.term_program, env.get("TERM_PROGRAM")) {
            if expected == actual {
                return true;
            }
        }
        !self.env.is_empty()
            && self.env.iter().all(|(var, expected)| match env.get(var) {
                Some(actual) => expected == ANY_VALUE || expected == actual,
                None => false,
            })
    }
}

/// Rendering overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji_width: Option<u8>,
    /// Per-glyph column widths
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specific_chars: BTreeMap<String, u8>,
    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One terminal emulator profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionConfig>,
    pub overrides: OverrideConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TerminalProfile {
    /// Column width override for a single glyph
    pub fn char_width(&self, glyph: &str) -> Option<u8> {
        self.overrides.specific_chars.get(glyph).copied()
    }

    pub fn emoji_width(&self) -> Option<u8> {
        self.overrides.emoji_width
    }
}

/// Validated terminal catalog
#[derive(Debug)]
pub struct TerminalRegistry {
    schema: Arc<Document>,
    profiles: BTreeMap<String, TerminalProfile>,
}

impl TerminalRegistry {
    /// Load and validate every profile in the store's terminal catalog.
    /// The first invalid profile aborts the load.
    pub fn load(store: &CatalogStore) -> Result<Self> {
        let schema = store.get_document(TERMINAL_CATEGORY, TERMINAL_VERSION, TERMINAL_SCHEMA)?;
        let compiled = JSONSchema::compile(&schema.content)
            .map_err(|e| RegistryError::invalid_document(schema.key.to_string(), e))?;

        let mut profiles = BTreeMap::new();
        for doc in store.documents_under(TERMINAL_CATEGORY, TERMINAL_VERSION, CATALOG_PREFIX)? {
            let profile = validate_profile(&compiled, &doc)?;
            debug!(terminal = %profile.name, "Validated terminal profile");
            if profiles.insert(profile.name.clone(), profile).is_some() {
                return Err(RegistryError::invalid_document(
                    doc.key.to_string(),
                    "duplicate terminal profile",
                ));
            }
        }

        info!(profiles = profiles.len(), "Loaded terminal catalog");
        Ok(Self { schema, profiles })
    }

    /// Every profile, keyed by name
    pub fn load_catalog(&self) -> &BTreeMap<String, TerminalProfile> {
        &self.profiles
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Exact, case-sensitive lookup
    pub fn get_config(&self, name: &str) -> Result<&TerminalProfile> {
        self.profiles
            .get(name)
            .ok_or_else(|| RegistryError::ConfigNotFound {
                name: name.to_string(),
            })
    }

    /// First profile, in name order, whose detection rules match `env`
    pub fn detect(&self, env: &HashMap<String, String>) -> Option<&TerminalProfile> {
        self.profiles.values().find(|p| {
            p.detection
                .as_ref()
                .is_some_and(|detection| detection.matches(env))
        })
    }

    /// Detect against the current process environment
    pub fn detect_current(&self) -> Option<&TerminalProfile> {
        let env: HashMap<String, String> = std::env::vars().collect();
        self.detect(&env)
    }

    /// The profile JSON schema
    pub fn schema(&self) -> Arc<Document> {
        Arc::clone(&self.schema)
    }
}

fn validate_profile(compiled: &JSONSchema, doc: &Document) -> Result<TerminalProfile> {
    let key = doc.key.stem();
    if !PROFILE_KEY.is_match(key) {
        return Err(RegistryError::invalid_document(
            doc.key.to_string(),
            format!("invalid terminal key {key:?}"),
        ));
    }

    if let Err(errors) = compiled.validate(&doc.content) {
        let reasons: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(RegistryError::invalid_document(
            doc.key.to_string(),
            reasons.join("; "),
        ));
    }

    let profile: TerminalProfile = doc.deserialize()?;
    if profile.name != key {
        return Err(RegistryError::TerminalNameMismatch {
            key: key.to_string(),
            declared: profile.name,
        });
    }
    Ok(profile)
}
