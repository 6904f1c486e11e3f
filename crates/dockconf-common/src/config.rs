//! Settings model for a composition run.

use serde::{Deserialize, Serialize};

/// Tunables for one resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Option whose entries name linked containers.
    pub links_key: String,
    /// Merge only known container parameters from configuration entries.
    pub strict_parameters: bool,
    /// Reject rendered containers without an `image` option.
    pub require_image: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            links_key: crate::constants::DEFAULT_LINKS_KEY.to_owned(),
            strict_parameters: false,
            require_image: false,
        }
    }
}
