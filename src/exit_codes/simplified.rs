//! Simplified exit modes and the on-disk mapping document

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse outcome bucket consumed by callers that only need to know whether
/// to retry, fix their invocation, or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimplifiedMode {
    Success,
    UsageError,
    TransientFailure,
    PermanentFailure,
}

impl SimplifiedMode {
    pub const ALL: [SimplifiedMode; 4] = [
        SimplifiedMode::Success,
        SimplifiedMode::UsageError,
        SimplifiedMode::TransientFailure,
        SimplifiedMode::PermanentFailure,
    ];

    /// Mode ID as written in mapping documents
    pub fn id(&self) -> &'static str {
        match self {
            SimplifiedMode::Success => "success",
            SimplifiedMode::UsageError => "usage-error",
            SimplifiedMode::TransientFailure => "transient-failure",
            SimplifiedMode::PermanentFailure => "permanent-failure",
        }
    }

    /// Process exit value for tools that run in simplified mode
    pub fn exit_value(&self) -> i32 {
        match self {
            SimplifiedMode::Success => 0,
            SimplifiedMode::PermanentFailure => 1,
            SimplifiedMode::UsageError => 2,
            SimplifiedMode::TransientFailure => 3,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SimplifiedMode::TransientFailure)
    }
}

impl fmt::Display for SimplifiedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SimplifiedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| format!("unknown simplified mode: {s}"))
    }
}

/// Raw mapping document (`foundry/<version>/simplified-modes.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingData {
    /// Exit-code set the mappings were written against
    pub taxonomy_version: String,
    pub default_mapping_version: String,
    #[serde(default)]
    pub mappings: Vec<MappingSpec>,
}

/// One mapping version as written on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSpec {
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Mode ID -> exit codes in that bucket
    #[serde(default)]
    pub modes: BTreeMap<String, Vec<i32>>,
}
