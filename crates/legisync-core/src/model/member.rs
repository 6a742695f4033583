//! Member domain model.

use serde::{Deserialize, Serialize};

use super::Chamber;

/// A member of Congress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub bioguide_id: String,
    pub name: String,
    pub party: Option<String>,
    pub state: Option<String>,
    pub chamber: Option<Chamber>,
    /// Remote modification timestamp, RFC 3339.
    pub updated_at: String,
}
