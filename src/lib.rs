//! Artifact Registry
//!
//! A read-only, versioned registry of shared artifacts: JSON/TOML schemas,
//! terminal rendering profiles, and the exit-code taxonomy with its
//! simplified-mode mappings.
//!
//! ## Features
//!
//! - **Versioned Catalog**: Documents addressed by `(category, version, name)`
//! - **Embedded Data**: The catalog is compiled into the crate; an on-disk tree
//!   can replace it
//! - **Checksums**: SHA256 per document and over the whole bundle
//! - **Terminal Profiles**: Schema-validated, with environment detection
//! - **Exit Codes**: Stable numeric codes with metadata and versioned
//!   simplified-mode mappings
//!
//! ## Architecture
//!
//! ```text
//! data/
//! ├── terminal/v1.0.0/
//! │   ├── schema.json
//! │   └── catalog/<Terminal>.toml
//! ├── foundry/v1.0.0/
//! │   └── simplified-modes.toml
//! ├── pathfinder/v1.0.0/*.schema.json
//! ├── ascii/v1.0.0/*.schema.json
//! ├── schema-validation/v1.0.0/*.schema.json
//! └── observability/logging/v1.0.0/*.schema.json
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! let info = artifact_registry::get_exit_code_info(31)?;
//! assert_eq!(info.name, "EXIT_DATABASE_UNAVAILABLE");
//!
//! let iterm = artifact_registry::get_terminal_config("iTerm2")?;
//! assert_eq!(iterm.overrides.emoji_width, Some(2));
//! # Ok::<(), artifact_registry::RegistryError>(())
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod document;
pub mod error;
pub mod exit_codes;
pub mod registry;
pub mod terminal;
pub mod version;

pub use catalog::CatalogStore;
pub use checksum::Checksum;
pub use config::RegistryConfig;
pub use document::{compare_schemas, normalize_schema, Document, DocumentFormat, DocumentKey, SchemaComparison};
pub use error::{MissingSegment, RegistryError, Result};
pub use exit_codes::{
    ExitCode, ExitCodeCategory, ExitCodeInfo, ExitCodeKey, ExitCodeTaxonomy, RetryHint,
    SimplifiedMode, EXIT_CODES_VERSION,
};
pub use registry::Registry;
pub use terminal::{DetectionConfig, OverrideConfig, TerminalProfile, TerminalRegistry};
pub use version::VersionTag;

/// Fetch a document from the bundled catalog
pub fn get_schema(category: &str, version: &str, name: &str) -> Result<Arc<Document>> {
    registry::shared()?.get_schema(category, version, name)
}

/// Schema-like document names in the bundled catalog; empty when the
/// category or version is unknown
pub fn list_schemas(category: &str, version: &str) -> Vec<String> {
    match registry::shared() {
        Ok(registry) => registry.list_schemas(category, version),
        Err(e) => {
            tracing::error!(error = %e, "bundled registry failed to load");
            Vec::new()
        }
    }
}

pub fn get_terminal_config(name: &str) -> Result<&'static TerminalProfile> {
    registry::shared()?.get_terminal_config(name)
}

pub fn load_terminal_catalog() -> Result<&'static BTreeMap<String, TerminalProfile>> {
    registry::shared()?.load_terminal_catalog()
}

pub fn get_exit_code_info(key: impl Into<ExitCodeKey>) -> Result<ExitCodeInfo> {
    registry::shared()?.get_exit_code_info(key)
}

/// Every exit code, ascending
pub fn get_detailed_codes() -> Result<Vec<ExitCodeInfo>> {
    Ok(registry::shared()?.get_detailed_codes())
}

pub fn map_to_simplified(
    key: impl Into<ExitCodeKey>,
    mapping_version: &str,
) -> Result<SimplifiedMode> {
    registry::shared()?.map_to_simplified(key, mapping_version)
}

/// Version tag of the exit-code set
pub fn get_exit_codes_version() -> &'static str {
    EXIT_CODES_VERSION
}
