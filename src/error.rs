//! Error types for the artifact registry

use std::fmt;

use thiserror::Error;

use crate::exit_codes::{ExitCode, ExitCodeKey};

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Which part of a `(category, version, name)` address failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSegment {
    Category,
    Version,
    Name,
}

impl fmt::Display for MissingSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MissingSegment::Category => "category",
            MissingSegment::Version => "version",
            MissingSegment::Name => "name",
        };
        f.write_str(s)
    }
}

/// Registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Document not found: {category}/{version}/{name} (unknown {segment})")]
    NotFound {
        category: String,
        version: String,
        name: String,
        segment: MissingSegment,
    },

    #[error("Terminal config not found: {name}")]
    ConfigNotFound { name: String },

    #[error("Unknown exit code: {key}")]
    UnknownExitCode { key: ExitCodeKey },

    #[error("Exit code {code} has no simplified mode under mapping version {version}")]
    MappingVersion { code: i32, version: String },

    #[error("Unsupported mapping version: {version}")]
    UnknownMappingVersion { version: String },

    #[error("Invalid simplified-mode mapping data: {0}")]
    InvalidMapping(String),

    #[error("Terminal profile {key} declares mismatched name {declared}")]
    TerminalNameMismatch { key: String, declared: String },

    #[error("Invalid document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Schema content is empty")]
    EmptySchema,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl RegistryError {
    pub(crate) fn not_found(
        category: &str,
        version: &str,
        name: &str,
        segment: MissingSegment,
    ) -> Self {
        RegistryError::NotFound {
            category: category.to_string(),
            version: version.to_string(),
            name: name.to_string(),
            segment,
        }
    }

    /// Taxonomy code a process should exit with when failing on this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RegistryError::NotFound { .. } => ExitCode::FileNotFound,
            RegistryError::ConfigNotFound { .. }
            | RegistryError::UnknownExitCode { .. }
            | RegistryError::UnknownMappingVersion { .. }
            | RegistryError::InvalidVersion(_) => ExitCode::InvalidArgument,
            RegistryError::MappingVersion { .. }
            | RegistryError::TerminalNameMismatch { .. }
            | RegistryError::InvalidDocument { .. }
            | RegistryError::EmptySchema => ExitCode::DataInvalid,
            RegistryError::InvalidMapping(_) => ExitCode::SsotVersionMismatch,
            RegistryError::Io(_) => ExitCode::FileReadError,
            RegistryError::Json(_) | RegistryError::Toml(_) => ExitCode::ParseError,
            RegistryError::Config(_) => ExitCode::ConfigInvalid,
        }
    }

    pub(crate) fn invalid_document(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        RegistryError::InvalidDocument {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
