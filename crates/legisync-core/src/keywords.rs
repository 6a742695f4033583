//! Keyword-to-committee mapping used by the keyword inference signal.
//!
//! The table is loaded once at startup and shared read-only across
//! concurrent inference calls; it is never mutated after load.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{SyncError, SyncResult};

/// Curated default mapping shipped with the binary.
const BUILTIN_TABLE: &str = include_str!("keywords.toml");

#[derive(Deserialize)]
struct KeywordFile {
    committees: BTreeMap<String, Vec<String>>,
}

/// Immutable mapping of committee system codes to keyword terms.
///
/// Many-to-one: a term may appear under several committees. Terms are
/// normalized to lowercase at load so matching stays case-insensitive.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    map: BTreeMap<String, Vec<String>>,
}

impl KeywordTable {
    /// Load the curated table shipped with the binary.
    pub fn builtin() -> Self {
        // The embedded table is validated by tests; a parse failure here is
        // a build artifact problem, not a runtime condition.
        Self::from_toml_str(BUILTIN_TABLE).unwrap_or_else(|_| Self {
            map: BTreeMap::new(),
        })
    }

    /// Parse a table from TOML text.
    pub fn from_toml_str(text: &str) -> SyncResult<Self> {
        let file: KeywordFile = toml::from_str(text)
            .map_err(|e| SyncError::Config(format!("invalid keyword table: {}", e)))?;
        let map = file
            .committees
            .into_iter()
            .map(|(code, terms)| {
                let mut terms: Vec<String> =
                    terms.into_iter().map(|t| t.to_lowercase()).collect();
                terms.sort();
                terms.dedup();
                (code, terms)
            })
            .collect();
        Ok(Self { map })
    }

    /// Load a table from a TOML file on disk.
    pub fn from_file(path: &std::path::Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Keyword terms for a committee, if any are curated.
    pub fn terms_for(&self, system_code: &str) -> Option<&[String]> {
        self.map.get(system_code).map(|v| v.as_slice())
    }

    /// Iterate all (system_code, terms) pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of committees with curated keywords.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
