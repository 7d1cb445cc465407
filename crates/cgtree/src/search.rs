//! Tree navigation and search
//!
//! Lookups by predicate, name, label, label set, or `/`-separated path of
//! name-or-label segments. Results keep child order; path searches return
//! matches in preorder discovery order.

use crate::criterion::{matches_segment, path_segments, Criterion};
use crate::{Tree, TreeError, TreeResult};

/// Child-index paths from `node` to every match of `segments`, in preorder.
/// Branches whose segment does not match are not explored.
fn collect_positions(node: &Tree, segments: &[&str], prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    for (i, child) in node.children().iter().enumerate() {
        if !matches_segment(child, segment) {
            continue;
        }
        prefix.push(i);
        if rest.is_empty() {
            out.push(prefix.clone());
        } else {
            collect_positions(child, rest, prefix, out);
        }
        prefix.pop();
    }
}

fn collect_nodes<'t>(node: &'t Tree, segments: &[&str], out: &mut Vec<&'t Tree>) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    for child in node.children() {
        if !matches_segment(child, segment) {
            continue;
        }
        if rest.is_empty() {
            out.push(child);
        } else {
            collect_nodes(child, rest, out);
        }
    }
}

/// Index paths of every node selected by `criterion` below `node`
fn positions(node: &Tree, criterion: &Criterion<'_>) -> Vec<Vec<usize>> {
    match criterion {
        Criterion::Path(path) => {
            let segments: Vec<&str> = path_segments(path).collect();
            let mut out = Vec::new();
            collect_positions(node, &segments, &mut Vec::new(), &mut out);
            out
        }
        _ => node
            .children()
            .iter()
            .enumerate()
            .filter(|(_, child)| criterion.matches(child))
            .map(|(i, _)| vec![i])
            .collect(),
    }
}

fn descend_mut<'t>(mut node: &'t mut Tree, position: &[usize]) -> &'t mut Tree {
    for &i in position {
        node = &mut node.children_mut()[i];
    }
    node
}

fn not_found(node: &Tree, criterion: &Criterion<'_>) -> TreeError {
    TreeError::NotFound {
        criterion: criterion.to_string(),
        parent: node.name().to_string(),
    }
}

impl Tree {
    /// Whether any child satisfies `criterion`
    pub fn has_child(&self, criterion: &Criterion<'_>) -> bool {
        match criterion {
            Criterion::Path(_) => !self.get_children(criterion).is_empty(),
            _ => self.children().iter().any(|child| criterion.matches(child)),
        }
    }

    /// Every child satisfying `criterion`, in order
    pub fn get_children(&self, criterion: &Criterion<'_>) -> Vec<&Tree> {
        match criterion {
            Criterion::Path(path) => {
                let segments: Vec<&str> = path_segments(path).collect();
                let mut out = Vec::new();
                collect_nodes(self, &segments, &mut out);
                out
            }
            _ => self.children().iter().filter(|child| criterion.matches(child)).collect(),
        }
    }

    /// First child satisfying `criterion`
    pub fn get_child(&self, criterion: &Criterion<'_>) -> TreeResult<&Tree> {
        let found = match criterion {
            Criterion::Path(_) => self.get_children(criterion).into_iter().next(),
            _ => self.children().iter().find(|child| criterion.matches(child)),
        };
        found.ok_or_else(|| not_found(self, criterion))
    }

    pub fn get_child_mut(&mut self, criterion: &Criterion<'_>) -> TreeResult<&mut Tree> {
        match positions(self, criterion).into_iter().next() {
            Some(position) => Ok(descend_mut(self, &position)),
            None => Err(not_found(self, criterion)),
        }
    }

    pub fn has_child_of_name(&self, name: &str) -> bool {
        self.has_child(&Criterion::Name(name))
    }

    pub fn has_child_of_label(&self, label: &str) -> bool {
        self.has_child(&Criterion::Label(label))
    }

    pub fn get_child_by_name(&self, name: &str) -> TreeResult<&Tree> {
        self.get_child(&Criterion::Name(name))
    }

    pub fn get_child_by_name_mut(&mut self, name: &str) -> TreeResult<&mut Tree> {
        self.get_child_mut(&Criterion::Name(name))
    }

    pub fn get_child_by_label(&self, label: &str) -> TreeResult<&Tree> {
        self.get_child(&Criterion::Label(label))
    }

    pub fn get_children_by_label(&self, label: &str) -> Vec<&Tree> {
        self.get_children(&Criterion::Label(label))
    }

    pub fn get_children_by_labels(&self, labels: &[&str]) -> Vec<&Tree> {
        self.get_children(&Criterion::Labels(labels))
    }

    /// Every node matching an absolute path.
    ///
    /// The first segment must be this node's name; each further segment must
    /// match, by name or label, a child of the previous match.
    pub fn get_nodes_by_matching(&self, path: &str) -> Vec<&Tree> {
        let segments: Vec<&str> = path_segments(path).collect();
        let Some((root, rest)) = segments.split_first() else {
            return Vec::new();
        };
        if *root != self.name() {
            return Vec::new();
        }
        if rest.is_empty() {
            return vec![self];
        }
        let mut out = Vec::new();
        collect_nodes(self, rest, &mut out);
        out
    }

    /// First node matching an absolute path, see [`Tree::get_nodes_by_matching`]
    pub fn get_node_by_path(&self, path: &str) -> TreeResult<&Tree> {
        self.get_nodes_by_matching(path)
            .into_iter()
            .next()
            .ok_or_else(|| not_found(self, &Criterion::Path(path)))
    }

    /// Remove every node selected by `criterion`, keeping the order of the
    /// rest. Returns how many were removed; removing nothing is not an error.
    pub fn remove_children_by(&mut self, criterion: &Criterion<'_>) -> usize {
        let found = positions(self, criterion);
        // Back to front so earlier positions stay valid.
        for position in found.iter().rev() {
            let Some((&last, parent)) = position.split_last() else {
                continue;
            };
            if let Some(removed) = descend_mut(self, parent).remove_child_at(last) {
                tracing::debug!("Removed {:?} ({}) from {:?}", removed.name(), removed.label(), self.name());
            }
        }
        found.len()
    }

    pub fn remove_child_by_name(&mut self, name: &str) -> usize {
        self.remove_children_by(&Criterion::Name(name))
    }

    pub fn remove_children_by_label(&mut self, label: &str) -> usize {
        self.remove_children_by(&Criterion::Label(label))
    }

    /// Put `replacement` in place of the first node selected by `criterion`
    /// and return the previous subtree.
    pub fn replace_child(&mut self, criterion: &Criterion<'_>, replacement: Tree) -> TreeResult<Tree> {
        let target = self.get_child_mut(criterion)?;
        let previous = std::mem::replace(target, replacement);
        tracing::debug!("Replaced {:?} ({})", previous.name(), previous.label());
        Ok(previous)
    }
}
