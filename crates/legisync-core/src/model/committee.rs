//! Committee domain model.

use serde::{Deserialize, Serialize};

use super::Chamber;

/// A committee or subcommittee.
///
/// The system code is the stable unique identifier. Immutable once created
/// except for name/status refresh. A null parent code means a top-level
/// committee; subcommittees reference their parent's system code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Committee {
    pub system_code: String,
    pub name: String,
    pub chamber: Chamber,
    pub parent_code: Option<String>,
    pub is_current: bool,
    /// Remote modification timestamp, RFC 3339.
    pub updated_at: String,
}

impl Committee {
    /// Whether this is a subcommittee.
    pub fn is_subcommittee(&self) -> bool {
        self.parent_code.is_some()
    }
}
