//! Display configuration

use serde::{Deserialize, Serialize};

use cgtree_value::DEFAULT_THRESHOLD;

/// Options for the text dump of trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Numeric values with more elements print as `{kind:dims}`
    pub threshold: usize,

    /// Spaces per depth level
    pub indent: usize,
}

impl FormatOptions {
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            indent: 2,
        }
    }
}
