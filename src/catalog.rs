//! Catalog Store
//!
//! Holds the raw bundled documents indexed by category and version, and
//! parses each `(category, version)` set on first access.
//!
//! ## Layout
//!
//! ```text
//! data/
//! ├── terminal/
//! │   └── v1.0.0/
//! │       ├── schema.json
//! │       └── catalog/
//! │           ├── iTerm2.toml
//! │           └── kitty.toml
//! ├── pathfinder/
//! │   └── v1.0.0/
//! │       └── find-query.schema.json
//! └── observability/logging/
//!     └── v1.0.0/
//!         └── log-event.schema.json
//! ```
//!
//! The first path segment that parses as a version tag splits the category
//! (everything before it) from the document name (everything after it).

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};
use std::sync::{Arc, OnceLock};

use include_dir::{include_dir, Dir};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::checksum::Checksum;
use crate::document::{Document, DocumentFormat, DocumentKey};
use crate::error::{MissingSegment, RegistryError, Result};
use crate::version::{sort_tags, VersionTag};

/// Catalog data compiled into the crate
pub static BUNDLED_DATA: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/data");

type RawBytes = Cow<'static, [u8]>;

/// Parse failure remembered for a single document
#[derive(Debug, Clone)]
struct ParseFault {
    path: String,
    reason: String,
}

impl From<ParseFault> for RegistryError {
    fn from(fault: ParseFault) -> Self {
        RegistryError::InvalidDocument {
            path: fault.path,
            reason: fault.reason,
        }
    }
}

type ParsedSet = BTreeMap<String, std::result::Result<Arc<Document>, ParseFault>>;

/// All documents of one `(category, version)` pair
#[derive(Debug)]
struct VersionSet {
    category: String,
    version: String,
    raw: BTreeMap<String, RawBytes>,
    parsed: OnceLock<ParsedSet>,
}

impl VersionSet {
    fn new(category: String, version: String) -> Self {
        Self {
            category,
            version,
            raw: BTreeMap::new(),
            parsed: OnceLock::new(),
        }
    }

    /// Parse every document in the set exactly once
    fn documents(&self) -> &ParsedSet {
        self.parsed.get_or_init(|| {
            debug!(
                category = %self.category,
                version = %self.version,
                documents = self.raw.len(),
                "parsing catalog version set"
            );
            self.raw
                .iter()
                .map(|(name, bytes)| {
                    let key = DocumentKey::new(&self.category, &self.version, name);
                    let path = key.to_string();
                    let parsed = Document::parse(key, bytes).map(Arc::new).map_err(|e| match e {
                        RegistryError::InvalidDocument { path, reason } => ParseFault { path, reason },
                        other => ParseFault { path, reason: other.to_string() },
                    });
                    (name.clone(), parsed)
                })
                .collect()
        })
    }

    /// Map a requested name onto a stored document name
    fn resolve(&self, name: &str) -> Option<&str> {
        if DocumentFormat::from_name(name).is_some() {
            return self.raw.get_key_value(name).map(|(k, _)| k.as_str());
        }
        let candidates = [
            format!("{name}.schema.json"),
            format!("{name}.schema.toml"),
            name.to_string(),
        ];
        candidates
            .iter()
            .find_map(|c| self.raw.get_key_value(c.as_str()).map(|(k, _)| k.as_str()))
    }

    fn get(&self, name: &str) -> Option<Result<Arc<Document>>> {
        let resolved = self.resolve(name)?;
        self.documents()
            .get(resolved)
            .map(|entry| entry.clone().map_err(RegistryError::from))
    }
}

/// Read-only store of versioned, categorized documents
#[derive(Debug)]
pub struct CatalogStore {
    categories: BTreeMap<String, BTreeMap<String, VersionSet>>,
    bundle_checksum: Checksum,
}

impl CatalogStore {
    /// Store over the data compiled into this crate
    pub fn bundled() -> Self {
        Self::from_embedded(&BUNDLED_DATA)
    }

    /// Store over an embedded directory (compiled via `include_dir!`)
    pub fn from_embedded(embedded_dir: &'static Dir<'static>) -> Self {
        let mut files: Vec<(String, RawBytes)> = Vec::with_capacity(64);
        collect_embedded_files(embedded_dir, &mut files);
        Self::from_entries(files)
    }

    /// Store over an on-disk directory with the same layout as the bundle
    pub fn from_directory(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(RegistryError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("catalog directory {} does not exist", root.display()),
            )));
        }

        let mut files: Vec<(String, RawBytes)> = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| RegistryError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| RegistryError::invalid_document(entry.path().display().to_string(), e))?;
            let bytes = fs::read(entry.path())?;
            files.push((slash_path(relative), Cow::Owned(bytes)));
        }

        Ok(Self::from_entries(files))
    }

    fn from_entries(mut files: Vec<(String, RawBytes)>) -> Self {
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let bundle_checksum =
            Checksum::from_entries(files.iter().map(|(path, bytes)| (path.as_str(), bytes.as_ref())));

        let mut categories: BTreeMap<String, BTreeMap<String, VersionSet>> = BTreeMap::new();
        for (path, bytes) in files {
            let Some((category, version, name)) = split_storage_path(&path) else {
                warn!(path = %path, "skipping catalog file outside a <category>/<version>/ directory");
                continue;
            };
            categories
                .entry(category.clone())
                .or_default()
                .entry(version.clone())
                .or_insert_with(|| VersionSet::new(category, version))
                .raw
                .insert(name, bytes);
        }

        info!(
            categories = categories.len(),
            bundle = %bundle_checksum,
            "catalog store loaded"
        );

        Self {
            categories,
            bundle_checksum,
        }
    }

    /// All category names, sorted
    pub fn categories(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    /// Versions of a category, sorted by semver; empty for unknown categories
    pub fn versions(&self, category: &str) -> Vec<String> {
        let mut tags: Vec<String> = self
            .categories
            .get(category)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default();
        sort_tags(&mut tags);
        tags
    }

    /// Names of every document in a version set, sorted. Unknown category
    /// or version yields an empty list.
    pub fn list_documents(&self, category: &str, version: &str) -> Vec<String> {
        self.categories
            .get(category)
            .and_then(|versions| versions.get(version))
            .map(|set| set.raw.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `(category, version, name)` resolves to a stored document
    pub fn contains(&self, category: &str, version: &str, name: &str) -> bool {
        self.categories
            .get(category)
            .and_then(|versions| versions.get(version))
            .and_then(|set| set.resolve(name))
            .is_some()
    }

    /// Fetch a parsed document
    pub fn get_document(&self, category: &str, version: &str, name: &str) -> Result<Arc<Document>> {
        let set = self.version_set(category, version, name)?;
        set.get(name)
            .unwrap_or_else(|| Err(RegistryError::not_found(category, version, name, MissingSegment::Name)))
    }

    /// Every parsed document whose name starts with `prefix`, in name order.
    /// Files without a JSON or TOML extension are skipped.
    pub fn documents_under(
        &self,
        category: &str,
        version: &str,
        prefix: &str,
    ) -> Result<Vec<Arc<Document>>> {
        let set = self.version_set(category, version, prefix)?;
        set.documents()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .filter(|(name, _)| {
                let supported = DocumentFormat::from_name(name).is_some();
                if !supported {
                    warn!(category, version, name = %name, "skipping non-document file");
                }
                supported
            })
            .map(|(_, entry)| entry.clone().map_err(RegistryError::from))
            .collect()
    }

    /// Digest over every stored `(path, bytes)` pair
    pub fn bundle_checksum(&self) -> &Checksum {
        &self.bundle_checksum
    }

    fn version_set(&self, category: &str, version: &str, name: &str) -> Result<&VersionSet> {
        let versions = self
            .categories
            .get(category)
            .ok_or_else(|| RegistryError::not_found(category, version, name, MissingSegment::Category))?;
        versions
            .get(version)
            .ok_or_else(|| RegistryError::not_found(category, version, name, MissingSegment::Version))
    }
}

/// Recursively collect files from an embedded directory
fn collect_embedded_files(dir: &'static Dir<'static>, files: &mut Vec<(String, RawBytes)>) {
    for file in dir.files() {
        files.push((slash_path(file.path()), Cow::Borrowed(file.contents())));
    }

    for subdir in dir.dirs() {
        collect_embedded_files(subdir, files);
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Split `a/b/v1.0.0/x/y.json` into `("a/b", "v1.0.0", "x/y.json")`
fn split_storage_path(path: &str) -> Option<(String, String, String)> {
    let segments: Vec<&str> = path.split('/').collect();
    let idx = segments
        .iter()
        .position(|s| s.starts_with('v') && VersionTag::is_tag(s))?;
    if idx == 0 || idx + 1 >= segments.len() {
        return None;
    }
    Some((
        segments[..idx].join("/"),
        segments[idx].to_string(),
        segments[idx + 1..].join("/"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture_store() -> (tempfile::TempDir, CatalogStore) {
        let dir = tempdir().unwrap();
        write(dir.path(), "widgets/v1.0.0/gear.schema.json", r#"{"$id": "gear", "type": "object"}"#);
        write(dir.path(), "widgets/v1.0.0/plain.json", r#"{"type": "string"}"#);
        write(dir.path(), "widgets/v1.0.0/nested/bolt.toml", "name = \"bolt\"\n");
        write(dir.path(), "widgets/v1.2.0/gear.schema.json", r#"{"$id": "gear-2"}"#);
        write(dir.path(), "widgets/v1.10.0/broken.schema.json", "{ not json");
        write(dir.path(), "observability/logging/v1.0.0/log-event.schema.json", r#"{"$schema": "x"}"#);
        write(dir.path(), "README.md", "not a catalog file");
        let store = CatalogStore::from_directory(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_split_storage_path() {
        assert_eq!(
            split_storage_path("a/b/v1.0.0/x/y.json"),
            Some(("a/b".to_string(), "v1.0.0".to_string(), "x/y.json".to_string()))
        );
        assert_eq!(split_storage_path("v1.0.0/x.json"), None);
        assert_eq!(split_storage_path("a/v1.0.0"), None);
        assert_eq!(split_storage_path("README.md"), None);
    }

    #[test]
    fn test_categories_and_versions() {
        let (_dir, store) = fixture_store();
        assert_eq!(store.categories(), vec!["observability/logging", "widgets"]);
        assert_eq!(store.versions("widgets"), vec!["v1.0.0", "v1.2.0", "v1.10.0"]);
        assert!(store.versions("missing").is_empty());
    }

    #[test]
    fn test_list_documents() {
        let (_dir, store) = fixture_store();
        assert_eq!(
            store.list_documents("widgets", "v1.0.0"),
            vec!["gear.schema.json", "nested/bolt.toml", "plain.json"]
        );
        assert!(store.list_documents("widgets", "v9.9.9").is_empty());
        assert!(store.list_documents("nope", "v1.0.0").is_empty());
    }

    #[test]
    fn test_name_resolution() {
        let (_dir, store) = fixture_store();
        let by_stem = store.get_document("widgets", "v1.0.0", "gear").unwrap();
        assert_eq!(by_stem.key.name, "gear.schema.json");
        let exact = store.get_document("widgets", "v1.0.0", "gear.schema.json").unwrap();
        assert_eq!(exact.content["$id"], "gear");
        let nested = store.get_document("widgets", "v1.0.0", "nested/bolt.toml").unwrap();
        assert_eq!(nested.content["name"], "bolt");
        assert!(store.contains("widgets", "v1.0.0", "plain.json"));
        assert!(!store.contains("widgets", "v1.0.0", "plain"));
    }

    #[test]
    fn test_not_found_segments() {
        let (_dir, store) = fixture_store();
        let segment = |c: &str, v: &str, n: &str| match store.get_document(c, v, n) {
            Err(RegistryError::NotFound { segment, .. }) => segment,
            other => panic!("expected NotFound, got {:?}", other),
        };
        assert_eq!(segment("nonexistent", "v1.0.0", "fake"), MissingSegment::Category);
        assert_eq!(segment("widgets", "v3.0.0", "gear"), MissingSegment::Version);
        assert_eq!(segment("widgets", "v1.0.0", "sprocket"), MissingSegment::Name);
    }

    #[test]
    fn test_parse_fault_is_reported_per_document() {
        let (_dir, store) = fixture_store();
        match store.get_document("widgets", "v1.10.0", "broken") {
            Err(RegistryError::InvalidDocument { path, .. }) => {
                assert_eq!(path, "widgets/v1.10.0/broken.schema.json");
            }
            other => panic!("expected InvalidDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_loading_is_memoized() {
        let (_dir, store) = fixture_store();
        let first = store.get_document("widgets", "v1.0.0", "gear").unwrap();
        let second = store.get_document("widgets", "v1.0.0", "gear.schema.json").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_documents_under_prefix() {
        let (_dir, store) = fixture_store();
        let docs = store.documents_under("widgets", "v1.0.0", "nested/").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].key.stem(), "bolt");
    }

    #[test]
    fn test_documents_under_skips_unsupported_files() {
        let (dir, _) = fixture_store();
        write(dir.path(), "widgets/v1.0.0/nested/NOTES.md", "# notes");
        write(dir.path(), "widgets/v1.0.0/nested/.DS_Store", "\0\0");
        let store = CatalogStore::from_directory(dir.path()).unwrap();

        let docs = store.documents_under("widgets", "v1.0.0", "nested/").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].key.name, "nested/bolt.toml");
        // Still listed, just not parsed as a document
        assert!(store
            .list_documents("widgets", "v1.0.0")
            .contains(&"nested/NOTES.md".to_string()));
    }

    #[test]
    fn test_bundle_checksum_is_stable() {
        let (dir, store) = fixture_store();
        let again = CatalogStore::from_directory(dir.path()).unwrap();
        assert_eq!(store.bundle_checksum(), again.bundle_checksum());

        write(dir.path(), "widgets/v1.0.0/plain.json", r#"{"type": "number"}"#);
        let changed = CatalogStore::from_directory(dir.path()).unwrap();
        assert_ne!(store.bundle_checksum(), changed.bundle_checksum());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(matches!(CatalogStore::from_directory(&missing), Err(RegistryError::Io(_))));
    }

    #[test]
    fn test_bundled_store_has_core_categories() {
        let store = CatalogStore::bundled();
        let categories = store.categories();
        for expected in ["terminal", "pathfinder", "foundry"] {
            assert!(categories.iter().any(|c| c == expected), "missing {expected}");
        }
    }
}
