//! Artifact Registry
//!
//! Single entry point over the catalog store, the terminal catalog and the
//! exit-code taxonomy. A [`Registry`] is immutable once built and can be
//! shared across threads by reference.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::checksum::Checksum;
use crate::config::RegistryConfig;
use crate::document::{Document, DocumentFormat};
use crate::error::{RegistryError, Result};
use crate::exit_codes::taxonomy::{MAPPINGS_CATEGORY, MAPPINGS_DOCUMENT, MAPPINGS_VERSION};
use crate::exit_codes::{ExitCodeInfo, ExitCodeKey, ExitCodeTaxonomy, SimplifiedMode};
use crate::terminal::{TerminalProfile, TerminalRegistry};

/// The artifact registry
#[derive(Debug)]
pub struct Registry {
    store: CatalogStore,
    terminals: OnceLock<TerminalRegistry>,
    taxonomy: ExitCodeTaxonomy,
    /// Overrides the mapping document's default
    default_mapping_version: Option<String>,
}

impl Registry {
    /// Registry over the compiled-in catalog
    pub fn bundled() -> Result<Self> {
        Self::with_store(CatalogStore::bundled())
    }

    /// Registry over an on-disk tree laid out as `<category>/<version>/<name>`
    pub fn from_directory(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_store(CatalogStore::from_directory(root.as_ref())?)
    }

    /// Registry described by a loaded configuration
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let mut registry = match config.data_path() {
            Some(root) => Self::from_directory(root)?,
            None => Self::bundled()?,
        };

        if let Some(version) = &config.default_mapping_version {
            // Reject unknown versions up front
            registry.taxonomy.unmapped_codes(version)?;
            registry.default_mapping_version = Some(version.clone());
        }
        Ok(registry)
    }

    fn with_store(store: CatalogStore) -> Result<Self> {
        let taxonomy = if store.contains(MAPPINGS_CATEGORY, MAPPINGS_VERSION, MAPPINGS_DOCUMENT) {
            let doc = store.get_document(MAPPINGS_CATEGORY, MAPPINGS_VERSION, MAPPINGS_DOCUMENT)?;
            ExitCodeTaxonomy::from_document(&doc)?
        } else {
            warn!("Catalog has no exit-code mappings; using compiled-in mappings");
            ExitCodeTaxonomy::bundled()?
        };

        info!(
            categories = store.categories().len(),
            checksum = %store.bundle_checksum(),
            "Registry ready"
        );

        Ok(Self {
            store,
            terminals: OnceLock::new(),
            taxonomy,
            default_mapping_version: None,
        })
    }

    /// The underlying document store
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn taxonomy(&self) -> &ExitCodeTaxonomy {
        &self.taxonomy
    }

    /// Fetch a schema (or any document) by address
    pub fn get_schema(&self, category: &str, version: &str, name: &str) -> Result<Arc<Document>> {
        self.store.get_document(category, version, name)
    }

    /// Top-level schema-like document names of a version set, sorted
    pub fn list_schemas(&self, category: &str, version: &str) -> Vec<String> {
        self.store
            .list_documents(category, version)
            .into_iter()
            .filter(|name| !name.contains('/'))
            .filter(|name| name.contains(".schema.") || DocumentFormat::from_name(name).is_some())
            .collect()
    }

    /// The validated terminal catalog, loaded on first use
    pub fn terminals(&self) -> Result<&TerminalRegistry> {
        if let Some(terminals) = self.terminals.get() {
            return Ok(terminals);
        }
        let loaded = TerminalRegistry::load(&self.store)?;
        // A concurrent loader may have won; both results are identical
        let _ = self.terminals.set(loaded);
        self.terminals.get().ok_or_else(|| {
            RegistryError::invalid_document("terminal", "terminal catalog failed to initialize")
        })
    }

    pub fn get_terminal_config(&self, name: &str) -> Result<&TerminalProfile> {
        self.terminals()?.get_config(name)
    }

    pub fn load_terminal_catalog(&self) -> Result<&BTreeMap<String, TerminalProfile>> {
        Ok(self.terminals()?.load_catalog())
    }

    pub fn get_exit_code_info(&self, key: impl Into<ExitCodeKey>) -> Result<ExitCodeInfo> {
        self.taxonomy.exit_code_info(key)
    }

    pub fn get_detailed_codes(&self) -> Vec<ExitCodeInfo> {
        self.taxonomy.detailed_codes()
    }

    /// Map a code under an explicit mapping version
    pub fn map_to_simplified(
        &self,
        key: impl Into<ExitCodeKey>,
        mapping_version: &str,
    ) -> Result<SimplifiedMode> {
        self.taxonomy.map_to_simplified(key, mapping_version)
    }

    /// Map a code under the configured (or document) default mapping version
    pub fn simplify(&self, key: impl Into<ExitCodeKey>) -> Result<SimplifiedMode> {
        self.taxonomy.map_to_simplified(key, &self.default_mapping_version())
    }

    pub fn default_mapping_version(&self) -> String {
        self.default_mapping_version
            .clone()
            .unwrap_or_else(|| self.taxonomy.default_mapping_version())
    }

    pub fn get_exit_codes_version(&self) -> &str {
        self.taxonomy.exit_codes_version()
    }

    /// Digest over every stored document
    pub fn bundle_checksum(&self) -> &Checksum {
        self.store.bundle_checksum()
    }
}

static SHARED: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry over the compiled-in catalog, built on first use
pub fn shared() -> Result<&'static Registry> {
    if let Some(registry) = SHARED.get() {
        return Ok(registry);
    }
    let _ = SHARED.set(Registry::bundled()?);
    SHARED.get().ok_or_else(|| {
        RegistryError::invalid_document("<bundled>", "shared registry failed to initialize")
    })
}
