//! Fixed-rank column-major views
//!
//! Zero-copy views over a node value's storage, indexed by `[usize; R]`
//! with the first index varying fastest.

use std::ops::{Index, IndexMut};

use crate::shape::linear_index;

/// Read-only view of rank `R`
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a, T, const R: usize> {
    data: &'a [T],
    extents: [usize; R],
}

impl<'a, T, const R: usize> ArrayView<'a, T, R> {
    pub(crate) fn new(data: &'a [T], extents: [usize; R]) -> Self {
        Self { data, extents }
    }

    #[inline]
    pub fn extents(&self) -> [usize; R] {
        self.extents
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Storage offset of `index`, `None` if out of bounds
    #[inline]
    pub fn linear_index(&self, index: [usize; R]) -> Option<usize> {
        linear_index(&self.extents, &index)
    }

    pub fn get(&self, index: [usize; R]) -> Option<&'a T> {
        let data = self.data;
        self.linear_index(index).map(|i| &data[i])
    }

    /// Elements in storage order
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.data.iter()
    }
}

impl<T, const R: usize> Index<[usize; R]> for ArrayView<'_, T, R> {
    type Output = T;

    fn index(&self, index: [usize; R]) -> &T {
        match self.linear_index(index) {
            Some(i) => &self.data[i],
            None => panic!("index {:?} out of bounds for extents {:?}", index, self.extents),
        }
    }
}

/// Mutable view of rank `R`
#[derive(Debug)]
pub struct ArrayViewMut<'a, T, const R: usize> {
    data: &'a mut [T],
    extents: [usize; R],
}

impl<'a, T, const R: usize> ArrayViewMut<'a, T, R> {
    pub(crate) fn new(data: &'a mut [T], extents: [usize; R]) -> Self {
        Self { data, extents }
    }

    #[inline]
    pub fn extents(&self) -> [usize; R] {
        self.extents
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn linear_index(&self, index: [usize; R]) -> Option<usize> {
        linear_index(&self.extents, &index)
    }

    pub fn get(&self, index: [usize; R]) -> Option<&T> {
        self.linear_index(index).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, index: [usize; R]) -> Option<&mut T> {
        self.linear_index(index).map(|i| &mut self.data[i])
    }

    pub fn as_slice(&self) -> &[T] {
        &*self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.data
    }
}

impl<T, const R: usize> Index<[usize; R]> for ArrayViewMut<'_, T, R> {
    type Output = T;

    fn index(&self, index: [usize; R]) -> &T {
        match self.linear_index(index) {
            Some(i) => &self.data[i],
            None => panic!("index {:?} out of bounds for extents {:?}", index, self.extents),
        }
    }
}

impl<T, const R: usize> IndexMut<[usize; R]> for ArrayViewMut<'_, T, R> {
    fn index_mut(&mut self, index: [usize; R]) -> &mut T {
        match self.linear_index(index) {
            Some(i) => &mut self.data[i],
            None => panic!("index {:?} out of bounds for extents {:?}", index, self.extents),
        }
    }
}
