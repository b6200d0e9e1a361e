//! Exit-code taxonomy with versioned simplified-mode mappings

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use super::{
    ExitCode, ExitCodeCategory, ExitCodeKey, MappingData, RetryHint, SimplifiedMode,
    EXIT_CODES_VERSION,
};
use crate::document::Document;
use crate::error::{RegistryError, Result};
use crate::version::VersionTag;

/// Catalog address of the mapping document
pub const MAPPINGS_CATEGORY: &str = "foundry";
pub const MAPPINGS_VERSION: &str = "v1.0.0";
pub const MAPPINGS_DOCUMENT: &str = "simplified-modes.toml";

/// Mapping document compiled into the crate
pub const BUNDLED_MAPPINGS: &str = include_str!("../../data/foundry/v1.0.0/simplified-modes.toml");

/// Full description of one exit code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitCodeInfo {
    pub code: i32,
    pub name: &'static str,
    pub description: &'static str,
    pub context: &'static str,
    pub category: ExitCodeCategory,
    pub retry_hint: Option<RetryHint>,
    /// True only for a `retry` hint. A code mapped to
    /// `transient-failure` without that hint stays false.
    pub retryable: bool,
    pub bsd_equivalent: Option<&'static str>,
    /// Bucket under the default mapping version
    pub simplified: SimplifiedMode,
}

impl ExitCodeInfo {
    fn new(code: ExitCode, simplified: SimplifiedMode) -> Self {
        let meta = code.info();
        Self {
            code: meta.code,
            name: meta.name,
            description: meta.description,
            context: meta.context,
            category: meta.category,
            retry_hint: meta.retry_hint,
            retryable: meta.retry_hint == Some(RetryHint::Retry),
            bsd_equivalent: meta.bsd_equivalent,
            simplified,
        }
    }
}

/// A code whose bucket differs between two mapping versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reclassification {
    pub code: ExitCode,
    pub from: SimplifiedMode,
    pub to: SimplifiedMode,
}

#[derive(Debug, Clone)]
struct MappingTable {
    description: Option<String>,
    buckets: BTreeMap<ExitCode, SimplifiedMode>,
}

/// The exit-code set plus every known mapping version.
///
/// Construction validates the mapping data; afterwards every query is a pure
/// lookup.
#[derive(Debug, Clone)]
pub struct ExitCodeTaxonomy {
    taxonomy_version: String,
    default_mapping: VersionTag,
    tables: BTreeMap<VersionTag, MappingTable>,
    /// One entry per code, ascending
    infos: Vec<ExitCodeInfo>,
}

impl ExitCodeTaxonomy {
    /// Taxonomy built from the compiled-in mapping document
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_MAPPINGS)
    }

    /// Parse a mapping document from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let data: MappingData = toml::from_str(text)?;
        Self::from_mapping_data(data)
    }

    /// Build from a catalog document (JSON or TOML)
    pub fn from_document(doc: &Document) -> Result<Self> {
        debug!(key = %doc.key, "Loading exit-code mappings from catalog");
        Self::from_mapping_data(doc.deserialize()?)
    }

    pub fn from_mapping_data(data: MappingData) -> Result<Self> {
        if data.taxonomy_version != EXIT_CODES_VERSION {
            return Err(RegistryError::InvalidMapping(format!(
                "mappings target taxonomy {} but the code set is {}",
                data.taxonomy_version, EXIT_CODES_VERSION
            )));
        }

        let mut tables = BTreeMap::new();
        for spec in data.mappings {
            let tag = VersionTag::parse(&spec.version).map_err(|e| {
                RegistryError::InvalidMapping(format!("bad mapping version: {e}"))
            })?;
            if tables.contains_key(&tag) {
                return Err(RegistryError::InvalidMapping(format!(
                    "mapping version {tag} defined twice"
                )));
            }

            let mut buckets = BTreeMap::new();
            for (mode_id, codes) in &spec.modes {
                let mode: SimplifiedMode = mode_id
                    .parse()
                    .map_err(|e| RegistryError::InvalidMapping(format!("{tag}: {e}")))?;
                for &value in codes {
                    let code = ExitCode::from_code(value).ok_or_else(|| {
                        RegistryError::InvalidMapping(format!(
                            "{tag}: code {value} is not part of the taxonomy"
                        ))
                    })?;
                    if buckets.insert(code, mode).is_some() {
                        return Err(RegistryError::InvalidMapping(format!(
                            "{tag}: code {value} is listed more than once"
                        )));
                    }
                }
            }

            tables.insert(
                tag,
                MappingTable {
                    description: spec.description,
                    buckets,
                },
            );
        }

        let default_mapping = VersionTag::parse(&data.default_mapping_version).map_err(|e| {
            RegistryError::InvalidMapping(format!("bad default mapping version: {e}"))
        })?;
        let default_table = tables.get(&default_mapping).ok_or_else(|| {
            RegistryError::InvalidMapping(format!(
                "default mapping version {default_mapping} is not defined"
            ))
        })?;

        let mut infos = Vec::with_capacity(ExitCode::ALL.len());
        let mut missing = Vec::new();
        for &code in ExitCode::ALL {
            match default_table.buckets.get(&code) {
                Some(&mode) => infos.push(ExitCodeInfo::new(code, mode)),
                None => missing.push(code.code()),
            }
        }
        if !missing.is_empty() {
            return Err(RegistryError::InvalidMapping(format!(
                "default mapping version {default_mapping} leaves codes unmapped: {missing:?}"
            )));
        }

        info!(
            taxonomy = EXIT_CODES_VERSION,
            default_mapping = %default_mapping,
            mapping_versions = tables.len(),
            "Loaded exit-code taxonomy"
        );

        Ok(Self {
            taxonomy_version: data.taxonomy_version,
            default_mapping,
            tables,
            infos,
        })
    }

    /// Version of the exit-code set (e.g. `v1.0.0`)
    pub fn exit_codes_version(&self) -> &str {
        &self.taxonomy_version
    }

    /// Look up one code by numeric value or symbolic name
    pub fn exit_code_info(&self, key: impl Into<ExitCodeKey>) -> Result<ExitCodeInfo> {
        let key = key.into();
        let found = match &key {
            ExitCodeKey::Code(code) => self.infos.iter().find(|i| i.code == *code),
            ExitCodeKey::Name(name) => self.infos.iter().find(|i| i.name == name.as_str()),
        };
        found.cloned().ok_or(RegistryError::UnknownExitCode { key })
    }

    /// Every code, ascending by numeric value
    pub fn detailed_codes(&self) -> Vec<ExitCodeInfo> {
        self.infos.clone()
    }

    pub fn codes_in_category(&self, category: ExitCodeCategory) -> Vec<ExitCodeInfo> {
        self.infos
            .iter()
            .filter(|i| i.category == category)
            .cloned()
            .collect()
    }

    /// Bucket for `key` under `mapping_version`.
    ///
    /// Checks the code first, then the version, then the version's table.
    pub fn map_to_simplified(
        &self,
        key: impl Into<ExitCodeKey>,
        mapping_version: &str,
    ) -> Result<SimplifiedMode> {
        let key = key.into();
        let code = ExitCode::lookup(&key).ok_or(RegistryError::UnknownExitCode { key })?;
        let (tag, table) = self.table(mapping_version)?;
        table
            .buckets
            .get(&code)
            .copied()
            .ok_or_else(|| RegistryError::MappingVersion {
                code: code.code(),
                version: tag.to_string(),
            })
    }

    /// Bucket for `key` under the default mapping version
    pub fn simplify(&self, key: impl Into<ExitCodeKey>) -> Result<SimplifiedMode> {
        self.exit_code_info(key).map(|i| i.simplified)
    }

    /// Known mapping versions, ascending
    pub fn mapping_versions(&self) -> Vec<String> {
        self.tables.keys().map(VersionTag::tag_string).collect()
    }

    pub fn default_mapping_version(&self) -> String {
        self.default_mapping.tag_string()
    }

    pub fn mapping_description(&self, mapping_version: &str) -> Result<Option<&str>> {
        let (_, table) = self.table(mapping_version)?;
        Ok(table.description.as_deref())
    }

    /// Codes with no bucket under `mapping_version`
    pub fn unmapped_codes(&self, mapping_version: &str) -> Result<Vec<ExitCode>> {
        let (_, table) = self.table(mapping_version)?;
        Ok(ExitCode::ALL
            .iter()
            .copied()
            .filter(|c| !table.buckets.contains_key(c))
            .collect())
    }

    /// Codes mapped by both versions whose bucket changed from `from` to `to`
    pub fn reclassified(&self, from: &str, to: &str) -> Result<Vec<Reclassification>> {
        let (_, old) = self.table(from)?;
        let (_, new) = self.table(to)?;
        Ok(ExitCode::ALL
            .iter()
            .filter_map(|code| match (old.buckets.get(code), new.buckets.get(code)) {
                (Some(&a), Some(&b)) if a != b => Some(Reclassification {
                    code: *code,
                    from: a,
                    to: b,
                }),
                _ => None,
            })
            .collect())
    }

    fn table(&self, mapping_version: &str) -> Result<(&VersionTag, &MappingTable)> {
        let unknown = || RegistryError::UnknownMappingVersion {
            version: mapping_version.to_string(),
        };
        let tag = VersionTag::parse(mapping_version).map_err(|_| unknown())?;
        self.tables.get_key_value(&tag).ok_or_else(unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKey;
    use regex::Regex;
    use std::collections::HashSet;

    const PARTIAL: &str = r#"
taxonomy_version = "v1.0.0"
default_mapping_version = "v1.0.0"

[[mappings]]
version = "v1.0.0"

[mappings.modes]
success = [0]
usage-error = [40, 41, 64, 94]
transient-failure = [13, 14, 15, 30, 31, 34]
permanent-failure = [
    1, 10, 11, 12, 20, 21, 22, 23, 24, 32, 33, 50, 51, 52, 53, 54, 60, 61, 62,
    63, 70, 71, 72, 73, 80, 81, 82, 83, 84, 91, 92, 93, 95, 96, 129, 130, 131,
    137, 138, 140, 141, 142, 143,
]

[[mappings]]
version = "v2.0.0-beta.1"

[mappings.modes]
success = [0]
permanent-failure = [1]
"#;

    fn bundled() -> ExitCodeTaxonomy {
        ExitCodeTaxonomy::bundled().unwrap()
    }

    #[test]
    fn test_bundled_loads() {
        let taxonomy = bundled();
        assert_eq!(taxonomy.exit_codes_version(), "v1.0.0");
        assert_eq!(taxonomy.default_mapping_version(), "v1.0.0");
        assert_eq!(taxonomy.mapping_versions(), vec!["v1.0.0", "v1.1.0"]);
        assert_eq!(taxonomy.detailed_codes().len(), ExitCode::ALL.len());
    }

    #[test]
    fn test_detailed_codes_sorted_and_unique() {
        let codes = bundled().detailed_codes();
        assert!(codes.windows(2).all(|w| w[0].code < w[1].code));
        let names: HashSet<_> = codes.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), codes.len());
    }

    #[test]
    fn test_names_are_screaming_snake() {
        let pattern = Regex::new(r"^EXIT_[A-Z0-9_]+$").unwrap();
        for info in bundled().detailed_codes() {
            assert!(pattern.is_match(info.name), "{}", info.name);
        }
    }

    #[test]
    fn test_lookup_round_trip() {
        let taxonomy = bundled();
        for info in taxonomy.detailed_codes() {
            assert_eq!(taxonomy.exit_code_info(info.code).unwrap(), info);
            assert_eq!(taxonomy.exit_code_info(info.name).unwrap(), info);
        }
    }

    #[test]
    fn test_known_entries() {
        let taxonomy = bundled();
        let success = taxonomy.exit_code_info(0).unwrap();
        assert_eq!(success.name, "EXIT_SUCCESS");
        assert_eq!(success.simplified, SimplifiedMode::Success);

        let db = taxonomy.exit_code_info("EXIT_DATABASE_UNAVAILABLE").unwrap();
        assert_eq!(db.code, 31);
        assert!(db.retryable);
        assert_eq!(db.simplified, SimplifiedMode::TransientFailure);

        let usage = taxonomy.exit_code_info(64).unwrap();
        assert_eq!(usage.bsd_equivalent, Some("EX_USAGE"));
        assert_eq!(usage.simplified, SimplifiedMode::UsageError);
    }

    #[test]
    fn test_unknown_code() {
        let taxonomy = bundled();
        assert!(matches!(
            taxonomy.exit_code_info(2),
            Err(RegistryError::UnknownExitCode { key: ExitCodeKey::Code(2) })
        ));
        assert!(matches!(
            taxonomy.exit_code_info("EXIT_NOPE"),
            Err(RegistryError::UnknownExitCode { .. })
        ));
        assert!(matches!(
            taxonomy.map_to_simplified(250, "v1.0.0"),
            Err(RegistryError::UnknownExitCode { .. })
        ));
    }

    #[test]
    fn test_every_version_is_total() {
        let taxonomy = bundled();
        for version in taxonomy.mapping_versions() {
            assert!(taxonomy.unmapped_codes(&version).unwrap().is_empty(), "{version}");
            for code in ExitCode::ALL {
                taxonomy.map_to_simplified(*code, &version).unwrap();
            }
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let taxonomy = bundled();
        for code in ExitCode::ALL {
            let first = taxonomy.map_to_simplified(*code, "v1.1.0").unwrap();
            let second = taxonomy.map_to_simplified(*code, "1.1.0").unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_default_mapping_agrees_with_info() {
        let taxonomy = bundled();
        for info in taxonomy.detailed_codes() {
            assert_eq!(taxonomy.map_to_simplified(info.code, "v1.0.0").unwrap(), info.simplified);
            assert_eq!(taxonomy.simplify(info.code).unwrap(), info.simplified);
        }
    }

    #[test]
    fn test_unknown_mapping_version() {
        let taxonomy = bundled();
        assert!(matches!(
            taxonomy.map_to_simplified(0, "v9.9.9"),
            Err(RegistryError::UnknownMappingVersion { version }) if version == "v9.9.9"
        ));
        assert!(matches!(
            taxonomy.map_to_simplified(0, "latest"),
            Err(RegistryError::UnknownMappingVersion { .. })
        ));
    }

    #[test]
    fn test_partial_mapping_version() {
        let taxonomy = ExitCodeTaxonomy::from_toml_str(PARTIAL).unwrap();
        assert_eq!(
            taxonomy.map_to_simplified(1, "v2.0.0-beta.1").unwrap(),
            SimplifiedMode::PermanentFailure
        );
        match taxonomy.map_to_simplified(143, "v2.0.0-beta.1") {
            Err(RegistryError::MappingVersion { code, version }) => {
                assert_eq!(code, 143);
                assert_eq!(version, "v2.0.0-beta.1");
            }
            other => panic!("expected MappingVersion, got {:?}", other),
        }
        let unmapped = taxonomy.unmapped_codes("v2.0.0-beta.1").unwrap();
        assert_eq!(unmapped.len(), ExitCode::ALL.len() - 2);
    }

    #[test]
    fn test_reclassified_between_versions() {
        let taxonomy = bundled();
        let changes = taxonomy.reclassified("v1.0.0", "v1.1.0").unwrap();
        assert!(changes.contains(&Reclassification {
            code: ExitCode::PortInUse,
            from: SimplifiedMode::PermanentFailure,
            to: SimplifiedMode::TransientFailure,
        }));
        assert!(changes.iter().all(|c| c.code != ExitCode::Success));
        assert!(taxonomy.reclassified("v1.0.0", "v1.0.0").unwrap().is_empty());
    }

    #[test]
    fn test_retryable_follows_retry_hint() {
        let taxonomy = bundled();
        let port = taxonomy.exit_code_info(ExitCode::PortInUse).unwrap();
        assert_eq!(taxonomy.map_to_simplified(10, "v1.1.0").unwrap(), SimplifiedMode::TransientFailure);
        assert_eq!(port.retry_hint, None);
        assert!(!port.retryable);

        for info in taxonomy.detailed_codes() {
            assert_eq!(info.retryable, info.retry_hint == Some(RetryHint::Retry), "{}", info.name);
        }
    }

    #[test]
    fn test_codes_in_category() {
        let signals = bundled().codes_in_category(ExitCodeCategory::Signals);
        assert_eq!(signals.len(), 9);
        assert!(signals.iter().all(|i| i.code >= 128));
    }

    #[test]
    fn test_rejects_duplicate_code() {
        let text = PARTIAL.replace("success = [0]\nusage-error", "success = [0, 1]\nusage-error");
        let err = ExitCodeTaxonomy::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidMapping(msg) if msg.contains("code 1")));
    }

    #[test]
    fn test_rejects_unknown_code_and_mode() {
        let text = PARTIAL.replace("permanent-failure = [1]", "permanent-failure = [1, 250]");
        assert!(matches!(
            ExitCodeTaxonomy::from_toml_str(&text),
            Err(RegistryError::InvalidMapping(msg)) if msg.contains("250")
        ));

        let text = PARTIAL.replace("permanent-failure = [1]", "retry-later = [1]");
        assert!(matches!(
            ExitCodeTaxonomy::from_toml_str(&text),
            Err(RegistryError::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_rejects_partial_default() {
        let text = PARTIAL.replace(
            "default_mapping_version = \"v1.0.0\"",
            "default_mapping_version = \"v2.0.0-beta.1\"",
        );
        assert!(matches!(
            ExitCodeTaxonomy::from_toml_str(&text),
            Err(RegistryError::InvalidMapping(msg)) if msg.contains("unmapped")
        ));
    }

    #[test]
    fn test_rejects_taxonomy_version_mismatch() {
        let text = PARTIAL.replace("taxonomy_version = \"v1.0.0\"", "taxonomy_version = \"v0.9.0\"");
        assert!(matches!(
            ExitCodeTaxonomy::from_toml_str(&text),
            Err(RegistryError::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_from_catalog_document() {
        let key = DocumentKey::new(MAPPINGS_CATEGORY, MAPPINGS_VERSION, MAPPINGS_DOCUMENT);
        let doc = Document::parse(key, BUNDLED_MAPPINGS.as_bytes()).unwrap();
        let taxonomy = ExitCodeTaxonomy::from_document(&doc).unwrap();
        assert_eq!(taxonomy.mapping_versions(), bundled().mapping_versions());
    }
}
