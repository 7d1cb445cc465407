//! Value errors

use crate::{ScalarKind, Shape};

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors raised by node value construction and access
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("Unknown scalar code: {code:?}")]
    UnknownScalarCode { code: String },

    #[error("Type mismatch: requested {requested}, value holds {actual}")]
    TypeMismatch {
        requested: ScalarKind,
        /// Code of the held kind, `"MT"` when empty
        actual: &'static str,
    },

    #[error("Rank mismatch: requested rank {requested}, value has rank {actual}")]
    RankMismatch { requested: usize, actual: usize },

    #[error("Invalid shape [{shape}] for {elements} elements")]
    InvalidShape { shape: Shape, elements: usize },

    #[error("Unsupported foreign type code: {code:?}")]
    UnsupportedForeignType { code: String },

    #[error("Foreign array of shape [{shape}] is not column-major")]
    NotColumnMajor { shape: Shape },
}
