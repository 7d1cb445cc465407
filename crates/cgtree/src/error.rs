//! Tree errors

use cgtree_value::ValueError;

/// Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Tree navigation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// No child satisfies the criterion
    #[error("No child matching {criterion} under {parent:?}")]
    NotFound { criterion: String, parent: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}
