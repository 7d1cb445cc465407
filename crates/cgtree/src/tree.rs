//! Owning n-ary tree
//!
//! Each `Tree` exclusively owns its value and every child subtree. Children
//! live in a `Vec`: appending may reallocate, so references to children
//! never survive a mutating call. The borrow checker enforces this.

use std::fmt;

use cgtree_value::{self as value, NodeValue};

use crate::FormatOptions;

/// Node of a dataset tree
#[derive(Debug, Default)]
pub struct Tree {
    name: String,
    label: String,
    value: NodeValue,
    children: Vec<Tree>,
}

impl Tree {
    /// Create a childless node
    pub fn new(name: impl Into<String>, label: impl Into<String>, value: impl Into<NodeValue>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            value: value.into(),
            children: Vec::new(),
        }
    }

    /// Create a childless node holding the empty value
    pub fn labeled(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, NodeValue::empty())
    }

    /// Create a node with children, kept in the given order
    pub fn with_children(
        name: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<NodeValue>,
        children: Vec<Tree>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            value: value.into(),
            children,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn label_mut(&mut self) -> &mut String {
        &mut self.label
    }

    #[inline]
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut NodeValue {
        &mut self.value
    }

    /// Replace the value, returning the previous one
    pub fn set_value(&mut self, value: impl Into<NodeValue>) -> NodeValue {
        std::mem::replace(&mut self.value, value.into())
    }

    #[inline]
    pub fn children(&self) -> &[Tree] {
        &self.children
    }

    /// Children as a mutable slice. Insertion and removal go through the
    /// dedicated methods.
    #[inline]
    pub fn children_mut(&mut self) -> &mut [Tree] {
        &mut self.children
    }

    /// Append `child`, taking ownership, and return it
    pub fn emplace_child(&mut self, child: Tree) -> &mut Tree {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Insert `child` at `index`, shifting later children. Appends when
    /// `index` is past the end.
    pub fn insert_child(&mut self, index: usize, child: Tree) -> &mut Tree {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
        &mut self.children[index]
    }

    /// Remove and return the child at `index`
    pub fn remove_child_at(&mut self, index: usize) -> Option<Tree> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    /// Detach all children
    pub fn take_children(&mut self) -> Vec<Tree> {
        std::mem::take(&mut self.children)
    }

    /// Number of nodes in the subtree, this one included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Tree::node_count).sum::<usize>()
    }

    /// Owning copy of the whole subtree
    pub fn deep_copy(&self) -> Tree {
        Tree {
            name: self.name.clone(),
            label: self.label.clone(),
            value: self.value.deep_copy(),
            children: self.children.iter().map(Tree::deep_copy).collect(),
        }
    }

    /// Preorder traversal yielding `(depth, node)`, depth 0 for `self`
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![(0, self)] }
    }
}

/// Preorder iterator over a tree
#[derive(Debug)]
pub struct Preorder<'a> {
    stack: Vec<(usize, &'a Tree)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (usize, &'a Tree);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

/// Pairwise preorder co-traversal, stopping at the first node pair that
/// fails `same_node` or differs in child count.
fn co_traverse(x: &Tree, y: &Tree, same_node: &impl Fn(&Tree, &Tree) -> bool) -> bool {
    if !same_node(x, y) || x.children.len() != y.children.len() {
        return false;
    }
    x.children
        .iter()
        .zip(&y.children)
        .all(|(cx, cy)| co_traverse(cx, cy, same_node))
}

fn same_header(x: &Tree, y: &Tree) -> bool {
    x.name == y.name && x.label == y.label
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        co_traverse(self, other, &|x, y| same_header(x, y) && x.value == y.value)
    }
}

/// Same names, labels and child counts at every position; values ignored.
pub fn same_structure(x: &Tree, y: &Tree) -> bool {
    co_traverse(x, y, &same_header)
}

/// Text dump with one `<indent><name>, <value>, <label>` line per node
pub fn to_string_with(tree: &Tree, options: &FormatOptions) -> String {
    let mut out = String::new();
    for (depth, node) in tree.preorder() {
        out.push_str(&" ".repeat(depth * options.indent));
        out.push_str(&node.name);
        out.push_str(", ");
        out.push_str(&value::to_string(&node.value, options.threshold));
        out.push_str(", ");
        out.push_str(&node.label);
        out.push('\n');
    }
    out
}

/// Text dump with the default indentation
pub fn to_string(tree: &Tree, threshold: usize) -> String {
    to_string_with(tree, &FormatOptions::with_threshold(threshold))
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_string_with(self, &FormatOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        Tree::with_children(
            "Base",
            "CGNSBase_t",
            NodeValue::from_vec(vec![3i32, 3]),
            vec![
                Tree::with_children(
                    "Zone",
                    "Zone_t",
                    NodeValue::from_literal(vec![vec![8i32, 1, 0]]).unwrap(),
                    vec![Tree::new("ZoneType", "ZoneType_t", "Unstructured")],
                ),
                Tree::labeled("Family", "Family_t"),
            ],
        )
    }

    #[test]
    fn test_construction_and_accessors() {
        let tree = sample();
        assert_eq!(tree.name(), "Base");
        assert_eq!(tree.label(), "CGNSBase_t");
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[0].children()[0].value().as_text().unwrap(), "Unstructured");
        assert!(tree.children()[1].value().is_empty());
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_emplace_child() {
        let mut tree = Tree::labeled("Base", "CGNSBase_t");
        let zone = tree.emplace_child(Tree::labeled("Zone", "Zone_t"));
        zone.emplace_child(Tree::new("GridLocation", "GridLocation_t", "Vertex"));
        assert_eq!(tree.children().len(), 1);
        assert_eq!(tree.children()[0].children().len(), 1);
    }

    #[test]
    fn test_insert_and_remove_at() {
        let mut tree = sample();
        tree.insert_child(1, Tree::labeled("Middle", "UserDefinedData_t"));
        let names: Vec<_> = tree.children().iter().map(Tree::name).collect();
        assert_eq!(names, vec!["Zone", "Middle", "Family"]);

        let removed = tree.remove_child_at(1).unwrap();
        assert_eq!(removed.name(), "Middle");
        assert!(tree.remove_child_at(5).is_none());
        assert_eq!(tree.children().len(), 2);
    }

    #[test]
    fn test_equality_reflexive() {
        let tree = sample();
        assert_eq!(tree, tree);
        assert_eq!(tree, sample());
    }

    #[test]
    fn test_structure_ignores_values() {
        let a = sample();
        let mut b = sample();
        b.children_mut()[0].set_value(NodeValue::from_vec(vec![1.0f64]));
        assert_ne!(a, b);
        assert!(same_structure(&a, &b));
    }

    #[test]
    fn test_structure_detects_mismatch() {
        let a = sample();
        let mut b = sample();
        b.children_mut()[1].label_mut().push_str("X");
        assert!(!same_structure(&a, &b));

        let mut c = sample();
        c.emplace_child(Tree::labeled("Extra", "Family_t"));
        assert!(!same_structure(&a, &c));
        assert_ne!(a, c);
    }

    #[test]
    fn test_preorder_order() {
        let tree = sample();
        let visited: Vec<_> = tree.preorder().map(|(d, n)| (d, n.name())).collect();
        assert_eq!(
            visited,
            vec![(0, "Base"), (1, "Zone"), (2, "ZoneType"), (1, "Family")]
        );
    }

    #[test]
    fn test_to_string() {
        let tree = sample();
        let text = to_string(&tree, 10);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Base, [3,3], CGNSBase_t");
        assert_eq!(lines[1], "  Zone, [[8,1,0]], Zone_t");
        assert_eq!(lines[2], "    ZoneType, Unstructured, ZoneType_t");
        assert_eq!(lines[3], "  Family, MT, Family_t");

        let summary = to_string(&tree, 1);
        assert!(summary.starts_with("Base, {I4:2}, CGNSBase_t"));
    }

    #[test]
    fn test_deep_copy() {
        let tree = sample();
        let copy = tree.deep_copy();
        assert_eq!(tree, copy);
        assert!(copy.preorder().all(|(_, n)| n.value().is_empty() || n.value().is_owner()));
    }
}
