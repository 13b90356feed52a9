use serde::{Deserialize, Serialize};

/// One configured repository as listed by `/repos`.
///
/// Repositories are addressed by their 1-based position in this list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub branch: String,
}
