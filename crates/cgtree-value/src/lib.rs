//! cgtree values - typed multi-dimensional arrays
//!
//! The payload unit of a cgtree: a value of one of five scalar kinds (or
//! empty), with a column-major shape, stored in a buffer that either owns its
//! memory or views memory owned by someone else.
//!
//! ```rust
//! use cgtree_value::{NodeValue, ScalarKind};
//!
//! let value = NodeValue::from_literal(vec![vec![2, 3, 4], vec![5, 6, 7]]).unwrap();
//! assert_eq!(value.kind(), Some(ScalarKind::Int32));
//! assert_eq!(value.to_string(), "[[2,3,4],[5,6,7]]");
//! ```

mod error;
mod scalar;
mod shape;
mod buffer;
mod literal;
mod view;
mod node_value;
pub mod foreign;

pub use error::{ValueError, ValueResult};
pub use scalar::{
    data_type_code, dispatch, dispatch_code, parse_data_type, KindOp, Scalar, ScalarKind, EMPTY_CODE,
};
pub use shape::Shape;
pub use buffer::{Buffer, Deallocator};
pub use literal::Literal;
pub use view::{ArrayView, ArrayViewMut};
pub use node_value::{same_buffer, to_string, NodeValue, TypedData, ValueVisitor, DEFAULT_THRESHOLD};
pub use foreign::{Capsule, ExportedArray, ForeignArray, ImportMode};
