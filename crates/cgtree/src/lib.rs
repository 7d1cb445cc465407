//! cgtree - hierarchical dataset trees
//!
//! A tree of named, labeled nodes, each carrying a typed array value, used to
//! hold mesh and simulation datasets in memory. Trees own their values and
//! children; values may own their memory or view memory owned by a host
//! runtime (see [`value::foreign`]).
//!
//! ```rust
//! use cgtree::{Criterion, NodeValue, Tree};
//!
//! let mut base = Tree::new("Base", "CGNSBase_t", NodeValue::from_vec(vec![3i32, 3]));
//! base.emplace_child(Tree::new("Zone", "Zone_t", NodeValue::from_vec(vec![8i64, 1, 0])));
//!
//! let zone = base.get_child(&Criterion::Label("Zone_t")).unwrap();
//! assert_eq!(zone.name(), "Zone");
//! assert_eq!(base.get_nodes_by_matching("Base/Zone_t").len(), 1);
//! ```

mod error;
mod config;
mod tree;
mod criterion;
mod search;

pub use cgtree_value as value;
pub use cgtree_value::{same_buffer, NodeValue, ScalarKind, Shape, ValueError};

pub use error::{TreeError, TreeResult};
pub use config::FormatOptions;
pub use tree::{same_structure, to_string, to_string_with, Preorder, Tree};
pub use criterion::{matches_segment, path_segments, Criterion, PATH_SEPARATOR};
