//! Nested literals
//!
//! `vec![vec![2, 3, 4], vec![5, 6, 7]]` reads row by row, with the outer
//! level as the leading dimension. Collection yields the row-major items and
//! the shape; the node value reorders them into column-major storage.

use crate::{Scalar, Shape, ValueError, ValueResult};

/// Scalar or nested sequence of scalars
pub trait Literal {
    type Elem: Scalar;

    /// Nesting depth (0 for a bare scalar)
    const RANK: usize;

    /// Append items in row-major order, recording or checking the extent at
    /// each depth.
    fn collect_into(&self, depth: usize, extents: &mut Vec<usize>, items: &mut Vec<Self::Elem>) -> ValueResult<()>;
}

macro_rules! impl_scalar_literal {
    ($($t:ty),*) => {
        $(
            impl Literal for $t {
                type Elem = $t;
                const RANK: usize = 0;

                fn collect_into(&self, _depth: usize, _extents: &mut Vec<usize>, items: &mut Vec<$t>) -> ValueResult<()> {
                    items.push(*self);
                    Ok(())
                }
            }
        )*
    };
}

impl_scalar_literal!(u8, i32, i64, f32, f64);

fn collect_level<L: Literal>(
    level: &[L],
    depth: usize,
    extents: &mut Vec<usize>,
    items: &mut Vec<L::Elem>,
) -> ValueResult<()> {
    if extents.len() == depth {
        extents.push(level.len());
    } else if extents[depth] != level.len() {
        // Ragged: siblings at the same depth disagree on length.
        let mut shape = extents.clone();
        shape[depth] = level.len();
        return Err(ValueError::InvalidShape {
            shape: Shape::from(shape),
            elements: items.len(),
        });
    }
    for sub in level {
        sub.collect_into(depth + 1, extents, items)?;
    }
    Ok(())
}

impl<L: Literal> Literal for Vec<L> {
    type Elem = L::Elem;
    const RANK: usize = L::RANK + 1;

    fn collect_into(&self, depth: usize, extents: &mut Vec<usize>, items: &mut Vec<L::Elem>) -> ValueResult<()> {
        collect_level(self, depth, extents, items)
    }
}

impl<L: Literal, const N: usize> Literal for [L; N] {
    type Elem = L::Elem;
    const RANK: usize = L::RANK + 1;

    fn collect_into(&self, depth: usize, extents: &mut Vec<usize>, items: &mut Vec<L::Elem>) -> ValueResult<()> {
        collect_level(self, depth, extents, items)
    }
}

/// Flatten a literal into row-major items and its extents.
///
/// Dimensions nested under an empty level get extent 0.
pub(crate) fn flatten<L: Literal>(literal: &L) -> ValueResult<(Vec<usize>, Vec<L::Elem>)> {
    let mut extents = Vec::with_capacity(L::RANK);
    let mut items = Vec::new();
    literal.collect_into(0, &mut extents, &mut items)?;
    extents.resize(L::RANK, 0);
    Ok((extents, items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_rows() {
        let (extents, items) = flatten(&vec![vec![2, 3, 4], vec![5, 6, 7]]).unwrap();
        assert_eq!(extents, vec![2, 3]);
        assert_eq!(items, vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_flatten_arrays() {
        let (extents, items) = flatten(&[[1.0f64, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        assert_eq!(extents, vec![3, 2]);
        assert_eq!(items.len(), 6);
    }

    #[test]
    fn test_flatten_scalar() {
        let (extents, items) = flatten(&7i64).unwrap();
        assert!(extents.is_empty());
        assert_eq!(items, vec![7]);
    }

    #[test]
    fn test_flatten_empty_outer() {
        let empty: Vec<Vec<i32>> = Vec::new();
        let (extents, items) = flatten(&empty).unwrap();
        assert_eq!(extents, vec![0, 0]);
        assert!(items.is_empty());
    }

    #[test]
    fn test_ragged_rejected() {
        let ragged = vec![vec![1, 2, 3], vec![4, 5]];
        assert!(matches!(flatten(&ragged), Err(ValueError::InvalidShape { .. })));
    }
}
