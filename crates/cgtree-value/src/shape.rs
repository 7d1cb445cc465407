//! Array shapes and column-major indexing
//!
//! Storage is Fortran order: the first dimension varies fastest.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Ordered extents of a multi-dimensional value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Rank 0 shape (used by the empty value)
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    pub fn new(extents: impl Into<Vec<usize>>) -> Self {
        Self(extents.into())
    }

    /// Number of dimensions
    #[inline]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Extent of dimension `dim`
    #[inline]
    pub fn extent(&self, dim: usize) -> Option<usize> {
        self.0.get(dim).copied()
    }

    #[inline]
    pub fn extents(&self) -> &[usize] {
        &self.0
    }

    /// Product of the extents, saturating at `usize::MAX`
    pub fn element_count(&self) -> usize {
        self.checked_element_count().unwrap_or(usize::MAX)
    }

    /// Product of the extents, `None` if it overflows `usize`
    pub fn checked_element_count(&self) -> Option<usize> {
        if self.0.contains(&0) {
            return Some(0);
        }
        self.0.iter().try_fold(1usize, |count, &extent| count.checked_mul(extent))
    }

    /// Whether at most one extent exceeds 1, so row- and column-major
    /// orders coincide
    pub fn is_linear(&self) -> bool {
        self.0.iter().filter(|&&extent| extent > 1).count() <= 1
    }

    /// Column-major strides, in elements
    pub fn strides(&self) -> Vec<usize> {
        column_major_strides(&self.0)
    }

    /// Linear storage offset of a multi-index, `None` if out of bounds
    pub fn linear_index(&self, index: &[usize]) -> Option<usize> {
        linear_index(&self.0, index)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, extent) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("x")?;
            }
            write!(f, "{}", extent)?;
        }
        Ok(())
    }
}

impl Index<usize> for Shape {
    type Output = usize;

    fn index(&self, dim: usize) -> &usize {
        &self.0[dim]
    }
}

impl From<Vec<usize>> for Shape {
    fn from(extents: Vec<usize>) -> Self {
        Self(extents)
    }
}

impl From<&[usize]> for Shape {
    fn from(extents: &[usize]) -> Self {
        Self(extents.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(extents: [usize; N]) -> Self {
        Self(extents.to_vec())
    }
}

pub(crate) fn column_major_strides(extents: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(extents.len());
    let mut stride: usize = 1;
    for &extent in extents {
        strides.push(stride);
        stride = stride.saturating_mul(extent);
    }
    strides
}

pub(crate) fn linear_index(extents: &[usize], index: &[usize]) -> Option<usize> {
    if index.len() != extents.len() {
        return None;
    }
    let mut offset: usize = 0;
    let mut stride = 1;
    for (&i, &extent) in index.iter().zip(extents) {
        if i >= extent {
            return None;
        }
        offset = i.checked_mul(stride).and_then(|step| offset.checked_add(step))?;
        stride = stride.saturating_mul(extent);
    }
    Some(offset)
}

/// Reorder row-major items (last dimension fastest) into column-major storage.
pub(crate) fn row_major_to_column_major<T: Copy>(items: &[T], extents: &[usize]) -> Vec<T> {
    if extents.len() < 2 {
        return items.to_vec();
    }
    let count = items.len();
    // Row-major strides: last dimension varies fastest.
    let mut row_strides = vec![1; extents.len()];
    for dim in (0..extents.len() - 1).rev() {
        row_strides[dim] = row_strides[dim + 1] * extents[dim + 1];
    }

    let mut out = Vec::with_capacity(count);
    let mut index = vec![0; extents.len()];
    for _ in 0..count {
        let source: usize = index.iter().zip(&row_strides).map(|(i, s)| i * s).sum();
        out.push(items[source]);
        // Advance the multi-index with the first dimension fastest.
        for dim in 0..extents.len() {
            index[dim] += 1;
            if index[dim] < extents[dim] {
                break;
            }
            index[dim] = 0;
        }
    }
    out
}
