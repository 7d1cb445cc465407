//! Child selection criteria

use std::fmt;

use crate::Tree;

/// Path separator
pub const PATH_SEPARATOR: char = '/';

/// How to select children
#[derive(Clone, Copy)]
pub enum Criterion<'a> {
    /// Arbitrary predicate on the child
    Predicate(&'a dyn Fn(&Tree) -> bool),
    /// Exact name
    Name(&'a str),
    /// Exact label
    Label(&'a str),
    /// Any of the labels
    Labels(&'a [&'a str]),
    /// `/`-separated segments, each matching a name or a label one level
    /// further down
    Path(&'a str),
}

impl Criterion<'_> {
    /// Whether `node` matches, for criteria that look at one node.
    ///
    /// A path criterion matches here only through its single segment.
    pub fn matches(&self, node: &Tree) -> bool {
        match self {
            Criterion::Predicate(predicate) => predicate(node),
            Criterion::Name(name) => node.name() == *name,
            Criterion::Label(label) => node.label() == *label,
            Criterion::Labels(labels) => labels.iter().any(|l| *l == node.label()),
            Criterion::Path(path) => {
                let mut segments = path_segments(path);
                match (segments.next(), segments.next()) {
                    (Some(segment), None) => matches_segment(node, segment),
                    _ => false,
                }
            }
        }
    }
}

impl fmt::Display for Criterion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Predicate(_) => f.write_str("predicate"),
            Criterion::Name(name) => write!(f, "name {:?}", name),
            Criterion::Label(label) => write!(f, "label {:?}", label),
            Criterion::Labels(labels) => write!(f, "labels {:?}", labels),
            Criterion::Path(path) => write!(f, "path {:?}", path),
        }
    }
}

impl fmt::Debug for Criterion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Non-empty segments of a path; repeated or edge separators are ignored
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
}

/// A path segment matches a node by name or by label
#[inline]
pub fn matches_segment(node: &Tree, segment: &str) -> bool {
    node.name() == segment || node.label() == segment
}
