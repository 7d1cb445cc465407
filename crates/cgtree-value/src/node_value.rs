//! Node value - typed, shaped array payload
//!
//! A `NodeValue` pairs a [`ScalarKind`] and a column-major [`Shape`] with a
//! [`Buffer`] that either owns its bytes or views memory owned elsewhere.
//! Values are move-only; use [`NodeValue::deep_copy`] for an explicit copy.

use std::fmt;
use std::ptr::NonNull;

use crate::buffer::Buffer;
use crate::literal::{flatten, Literal};
use crate::scalar::{data_type_code, dispatch, KindOp};
use crate::shape::row_major_to_column_major;
use crate::view::{ArrayView, ArrayViewMut};
use crate::{Scalar, ScalarKind, Shape, ValueError, ValueResult};

/// Default element count above which numeric values print as a summary
pub const DEFAULT_THRESHOLD: usize = 10;

/// Typed array value
#[derive(Debug, Default)]
pub struct NodeValue {
    /// `None` is the empty ("MT") value
    kind: Option<ScalarKind>,
    shape: Shape,
    buffer: Buffer,
}

/// Borrowed data of a node value, one variant per kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedData<'a> {
    Empty,
    Char8(&'a [u8]),
    Int32(&'a [i32]),
    Int64(&'a [i64]),
    Float32(&'a [f32]),
    Float64(&'a [f64]),
}

/// Operation applied to a node value's concretely typed data
pub trait ValueVisitor {
    type Output;

    fn visit<T: Scalar>(self, data: &[T], shape: &Shape) -> Self::Output;

    fn visit_empty(self) -> Self::Output;
}

/// Byte length of a `kind` array of `shape`, rejecting shapes whose size
/// does not fit in an allocation.
fn byte_len(kind: ScalarKind, shape: &Shape) -> ValueResult<usize> {
    let elements = shape.checked_element_count();
    elements
        .filter(|_| shape.rank() > 0)
        .and_then(|count| count.checked_mul(kind.byte_width()))
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or_else(|| ValueError::InvalidShape {
            shape: shape.clone(),
            elements: elements.unwrap_or(usize::MAX),
        })
}

fn check_shape(shape: &Shape, elements: usize) -> ValueResult<()> {
    // Rank 0 is reserved for the empty value; scalars are length-1 arrays.
    if shape.rank() == 0 || shape.checked_element_count() != Some(elements) {
        return Err(ValueError::InvalidShape {
            shape: shape.clone(),
            elements,
        });
    }
    Ok(())
}

impl NodeValue {
    /// The empty ("MT") value
    pub fn empty() -> Self {
        Self::default()
    }

    /// Owned 1-D value
    pub fn from_vec<T: Scalar>(items: Vec<T>) -> Self {
        let shape = Shape::from([items.len()]);
        Self {
            kind: Some(T::KIND),
            shape,
            buffer: Buffer::from_vec(items),
        }
    }

    /// Owned value with an explicit shape; `items` are in column-major order.
    pub fn from_array<T: Scalar>(shape: impl Into<Shape>, items: Vec<T>) -> ValueResult<Self> {
        let shape = shape.into();
        check_shape(&shape, items.len())?;
        Ok(Self {
            kind: Some(T::KIND),
            shape,
            buffer: Buffer::from_vec(items),
        })
    }

    /// Length-1 owned value holding `item`
    pub fn from_scalar<T: Scalar>(item: T) -> Self {
        Self::from_vec(vec![item])
    }

    /// Owned Char8 array of the string's bytes (no terminator)
    pub fn from_text(text: &str) -> Self {
        Self::from_vec(text.as_bytes().to_vec())
    }

    /// Owned value from a nested literal read row by row.
    ///
    /// The outer level is the leading dimension; storage is converted to
    /// column-major. A bare scalar becomes a length-1 array.
    pub fn from_literal<L: Literal>(literal: L) -> ValueResult<Self> {
        let (extents, items) = flatten(&literal)?;
        if extents.is_empty() {
            return Ok(Self::from_vec(items));
        }
        let items = row_major_to_column_major(&items, &extents);
        Self::from_array(extents, items)
    }

    /// Non-owning 1-D view of `data`.
    ///
    /// # Safety
    /// `data` must stay alive and unmoved for as long as the returned value
    /// (or any alias of it) is used, and must not be accessed through another
    /// path while the value writes to it.
    pub unsafe fn view_of<T: Scalar>(data: &mut [T]) -> Self {
        let shape = Shape::from([data.len()]);
        let len = std::mem::size_of_val(data);
        let ptr = NonNull::from(data).cast::<u8>();
        Self {
            kind: Some(T::KIND),
            shape,
            buffer: unsafe { Buffer::borrowed(ptr, len) },
        }
    }

    /// Non-owning multi-dimensional view of column-major `data`.
    ///
    /// # Safety
    /// Same contract as [`NodeValue::view_of`].
    pub unsafe fn view_array_of<T: Scalar>(shape: impl Into<Shape>, data: &mut [T]) -> ValueResult<Self> {
        let shape = shape.into();
        check_shape(&shape, data.len())?;
        let mut value = unsafe { Self::view_of(data) };
        value.shape = shape;
        Ok(value)
    }

    /// Non-owning view of raw memory holding `kind` elements.
    ///
    /// # Safety
    /// `ptr` must be aligned for `kind` and valid for
    /// `shape.element_count() * kind.byte_width()` bytes for as long as the
    /// value is used.
    pub unsafe fn from_raw_view(kind: ScalarKind, shape: impl Into<Shape>, ptr: NonNull<u8>) -> ValueResult<Self> {
        let shape = shape.into();
        let len = byte_len(kind, &shape)?;
        Ok(Self {
            kind: Some(kind),
            shape,
            buffer: unsafe { Buffer::borrowed(ptr, len) },
        })
    }

    /// Build a value around an existing buffer.
    ///
    /// # Safety
    /// The buffer must hold `shape.element_count()` aligned elements of `kind`.
    pub unsafe fn from_buffer(kind: ScalarKind, shape: impl Into<Shape>, buffer: Buffer) -> ValueResult<Self> {
        let shape = shape.into();
        if buffer.len() != byte_len(kind, &shape)? {
            return Err(ValueError::InvalidShape {
                shape,
                elements: buffer.len() / kind.byte_width(),
            });
        }
        Ok(Self {
            kind: Some(kind),
            shape,
            buffer,
        })
    }

    /// Non-owning view sharing this value's memory.
    ///
    /// # Safety
    /// `self` must outlive the alias, and the two must not be written through
    /// concurrently with other access.
    pub unsafe fn alias(&self) -> Self {
        Self {
            kind: self.kind,
            shape: self.shape.clone(),
            buffer: unsafe { Buffer::borrowed(self.buffer.as_non_null(), self.buffer.len()) },
        }
    }

    /// Owning copy of the data, whatever the ownership of `self`
    pub fn deep_copy(&self) -> Self {
        struct Duplicate;

        impl ValueVisitor for Duplicate {
            type Output = NodeValue;

            fn visit<T: Scalar>(self, data: &[T], shape: &Shape) -> NodeValue {
                NodeValue {
                    kind: Some(T::KIND),
                    shape: shape.clone(),
                    buffer: Buffer::from_vec(data.to_vec()),
                }
            }

            fn visit_empty(self) -> NodeValue {
                NodeValue::empty()
            }
        }

        self.visit(Duplicate)
    }

    /// Element kind, `None` for the empty value
    #[inline]
    pub fn kind(&self) -> Option<ScalarKind> {
        self.kind
    }

    /// Kind code, `"MT"` for the empty value
    #[inline]
    pub fn data_type(&self) -> &'static str {
        data_type_code(self.kind)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    #[inline]
    pub fn extent(&self, dim: usize) -> Option<usize> {
        self.shape.extent(dim)
    }

    /// Number of elements (0 for the empty value)
    pub fn element_count(&self) -> usize {
        match self.kind {
            Some(_) => self.shape.element_count(),
            None => 0,
        }
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    #[inline]
    pub fn is_owner(&self) -> bool {
        self.buffer.is_owner()
    }

    /// Give up ownership of the buffer. See [`Buffer::release`].
    pub fn release(&mut self) -> bool {
        self.buffer.release()
    }

    /// Change the shape without touching the data
    pub fn reshape(&mut self, shape: impl Into<Shape>) -> ValueResult<()> {
        let shape = shape.into();
        if self.kind.is_none() {
            return Err(ValueError::InvalidShape { shape, elements: 0 });
        }
        check_shape(&shape, self.shape.element_count())?;
        self.shape = shape;
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Option<ScalarKind>, Shape, Buffer) {
        (self.kind, self.shape, self.buffer)
    }

    /// Typed data as a sum type
    pub fn data(&self) -> TypedData<'_> {
        let Some(kind) = self.kind else {
            return TypedData::Empty;
        };
        // The invariant guarantees the buffer holds `kind` elements.
        unsafe {
            match kind {
                ScalarKind::Char8 => TypedData::Char8(self.buffer.as_typed()),
                ScalarKind::Int32 => TypedData::Int32(self.buffer.as_typed()),
                ScalarKind::Int64 => TypedData::Int64(self.buffer.as_typed()),
                ScalarKind::Float32 => TypedData::Float32(self.buffer.as_typed()),
                ScalarKind::Float64 => TypedData::Float64(self.buffer.as_typed()),
            }
        }
    }

    /// Apply `visitor` to the concretely typed data
    pub fn visit<V: ValueVisitor>(&self, visitor: V) -> V::Output {
        match self.data() {
            TypedData::Empty => visitor.visit_empty(),
            TypedData::Char8(data) => visitor.visit(data, &self.shape),
            TypedData::Int32(data) => visitor.visit(data, &self.shape),
            TypedData::Int64(data) => visitor.visit(data, &self.shape),
            TypedData::Float32(data) => visitor.visit(data, &self.shape),
            TypedData::Float64(data) => visitor.visit(data, &self.shape),
        }
    }

    fn check_kind<T: Scalar>(&self) -> ValueResult<()> {
        if self.kind != Some(T::KIND) {
            return Err(ValueError::TypeMismatch {
                requested: T::KIND,
                actual: self.data_type(),
            });
        }
        Ok(())
    }

    /// Zero-copy flat view in storage order
    pub fn as_slice<T: Scalar>(&self) -> ValueResult<&[T]> {
        self.check_kind::<T>()?;
        Ok(unsafe { self.buffer.as_typed() })
    }

    pub fn as_mut_slice<T: Scalar>(&mut self) -> ValueResult<&mut [T]> {
        self.check_kind::<T>()?;
        Ok(unsafe { self.buffer.as_typed_mut() })
    }

    /// Copy of the data in storage order
    pub fn to_vec<T: Scalar>(&self) -> ValueResult<Vec<T>> {
        self.as_slice::<T>().map(<[T]>::to_vec)
    }

    /// Raw Char8 content as text
    pub fn as_text(&self) -> ValueResult<String> {
        let bytes = self.as_slice::<u8>()?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn extents<const R: usize>(&self) -> ValueResult<[usize; R]> {
        <[usize; R]>::try_from(self.shape.extents()).map_err(|_| ValueError::RankMismatch {
            requested: R,
            actual: self.rank(),
        })
    }

    /// Zero-copy view of rank `R`
    pub fn view_as_array<T: Scalar, const R: usize>(&self) -> ValueResult<ArrayView<'_, T, R>> {
        let data = self.as_slice::<T>()?;
        let extents = self.extents::<R>()?;
        Ok(ArrayView::new(data, extents))
    }

    pub fn view_as_array_mut<T: Scalar, const R: usize>(&mut self) -> ValueResult<ArrayViewMut<'_, T, R>> {
        self.check_kind::<T>()?;
        let extents = self.extents::<R>()?;
        let data = unsafe { self.buffer.as_typed_mut() };
        Ok(ArrayViewMut::new(data, extents))
    }

    /// Element at a multi-index, `None` if out of bounds
    pub fn get<T: Scalar>(&self, index: &[usize]) -> ValueResult<Option<T>> {
        let data = self.as_slice::<T>()?;
        Ok(self.shape.linear_index(index).map(|i| data[i]))
    }
}

/// Whether `x` and `y` are backed by the same memory, regardless of content
///
/// Zero-length buffers share a dangling address, so they only count as the
/// same when `x` and `y` are the same value.
pub fn same_buffer(x: &NodeValue, y: &NodeValue) -> bool {
    std::ptr::eq(x, y) || (!x.buffer.is_empty() && x.buffer.same_memory(&y.buffer))
}

struct EqualTo<'a>(&'a NodeValue);

impl ValueVisitor for EqualTo<'_> {
    type Output = bool;

    fn visit<T: Scalar>(self, data: &[T], _shape: &Shape) -> bool {
        // Slice equality uses PartialEq: NaN != NaN.
        self.0.as_slice::<T>().is_ok_and(|other| other == data)
    }

    fn visit_empty(self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for NodeValue {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.shape != other.shape {
            return false;
        }
        if self.kind.is_some() && same_buffer(self, other) {
            return true;
        }
        self.visit(EqualTo(other))
    }
}

struct Render<'a> {
    out: &'a mut String,
    threshold: usize,
}

fn render_nested<T: Scalar>(out: &mut String, data: &[T], extents: &[usize], strides: &[usize], dim: usize, offset: usize) {
    use std::fmt::Write;

    out.push('[');
    for i in 0..extents[dim] {
        if i > 0 {
            out.push(',');
        }
        let at = offset + i * strides[dim];
        if dim + 1 == extents.len() {
            let _ = write!(out, "{}", data[at]);
        } else {
            render_nested(out, data, extents, strides, dim + 1, at);
        }
    }
    out.push(']');
}

impl ValueVisitor for Render<'_> {
    type Output = ();

    fn visit<T: Scalar>(self, data: &[T], shape: &Shape) {
        use std::fmt::Write;

        if data.len() > self.threshold {
            let _ = write!(self.out, "{{{}:{}}}", T::KIND, shape);
            return;
        }
        render_nested(self.out, data, shape.extents(), &shape.strides(), 0, 0);
    }

    fn visit_empty(self) {
        self.out.push_str(crate::scalar::EMPTY_CODE);
    }
}

/// Text form of a value.
///
/// `"MT"` for empty, the raw text for Char8, nested brackets for numeric
/// values of at most `threshold` elements, `{kind:dims}` otherwise.
pub fn to_string(value: &NodeValue, threshold: usize) -> String {
    let mut out = String::new();
    match value.data() {
        TypedData::Char8(bytes) => out.push_str(&String::from_utf8_lossy(bytes)),
        _ => value.visit(Render { out: &mut out, threshold }),
    }
    out
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_string(self, DEFAULT_THRESHOLD))
    }
}

struct CopyFromRaw<'a> {
    ptr: NonNull<u8>,
    shape: &'a Shape,
}

impl KindOp for CopyFromRaw<'_> {
    type Output = ValueResult<NodeValue>;

    fn call<T: Scalar>(self) -> Self::Output {
        let count = self.shape.element_count();
        let items = if count == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(self.ptr.cast::<T>().as_ptr(), count) }.to_vec()
        };
        NodeValue::from_array(self.shape.clone(), items)
    }
}

impl NodeValue {
    /// Owning copy of raw memory holding `kind` elements.
    ///
    /// # Safety
    /// `ptr` must be aligned for `kind` and valid for reads of
    /// `shape.element_count() * kind.byte_width()` bytes.
    pub unsafe fn copy_from_raw(kind: ScalarKind, shape: impl Into<Shape>, ptr: NonNull<u8>) -> ValueResult<Self> {
        let shape = shape.into();
        byte_len(kind, &shape)?;
        dispatch(kind, CopyFromRaw { ptr, shape: &shape })
    }
}

macro_rules! impl_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for NodeValue {
                fn from(item: $t) -> Self {
                    Self::from_scalar(item)
                }
            }

            impl From<Vec<$t>> for NodeValue {
                fn from(items: Vec<$t>) -> Self {
                    Self::from_vec(items)
                }
            }
        )*
    };
}

impl_from_scalar!(u8, i32, i64, f32, f64);

impl From<&str> for NodeValue {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for NodeValue {
    fn from(text: String) -> Self {
        Self::from_vec(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value() {
        let value = NodeValue::empty();
        assert!(value.is_empty());
        assert_eq!(value.kind(), None);
        assert_eq!(value.data_type(), "MT");
        assert_eq!(value.rank(), 0);
        assert_eq!(value.element_count(), 0);
        assert_eq!(value.to_string(), "MT");
        assert_eq!(value, NodeValue::default());
    }

    #[test]
    fn test_from_vec() {
        let value = NodeValue::from_vec(vec![1i32, 2, 3]);
        assert_eq!(value.kind(), Some(ScalarKind::Int32));
        assert_eq!(value.shape(), &Shape::from([3]));
        assert!(value.is_owner());
        assert_eq!(value.buffer().len(), 12);
        assert_eq!(value.as_slice::<i32>().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_scalar_and_text() {
        let value = NodeValue::from(2.5f64);
        assert_eq!(value.shape(), &Shape::from([1]));
        assert_eq!(value.to_string(), "[2.5]");

        let text = NodeValue::from("Zone_t");
        assert_eq!(text.kind(), Some(ScalarKind::Char8));
        assert_eq!(text.extent(0), Some(6));
        assert_eq!(text.to_string(), "Zone_t");
        assert_eq!(text.as_text().unwrap(), "Zone_t");
    }

    #[test]
    fn test_literal_round_trip() {
        let matrix = NodeValue::from_literal(vec![vec![2, 3, 4], vec![5, 6, 7]]).unwrap();
        assert_eq!(matrix.shape(), &Shape::from([2, 3]));
        assert_eq!(matrix.as_slice::<i32>().unwrap(), &[2, 5, 3, 6, 4, 7]);
        assert_eq!(to_string(&matrix, 10), "[[2,3,4],[5,6,7]]");

        let line = NodeValue::from_literal(vec![0, 1, 2]).unwrap();
        assert_eq!(line.to_string(), "[0,1,2]");
    }

    #[test]
    fn test_summary_above_threshold() {
        let value = NodeValue::from_array([3, 4], vec![0.0f64; 12]).unwrap();
        assert_eq!(to_string(&value, 10), "{R8:3x4}");
        assert_eq!(to_string(&value, 12).matches('[').count(), 4);
    }

    #[test]
    fn test_invalid_shape() {
        let err = NodeValue::from_array([2, 2], vec![1i64, 2, 3]).unwrap_err();
        assert!(matches!(err, ValueError::InvalidShape { elements: 3, .. }));
        assert!(NodeValue::from_array(Shape::scalar(), vec![1i64]).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let value = NodeValue::from_vec(vec![1i32]);
        let err = value.as_slice::<i64>().unwrap_err();
        assert_eq!(
            err,
            ValueError::TypeMismatch {
                requested: ScalarKind::Int64,
                actual: "I4"
            }
        );
        assert!(NodeValue::empty().as_slice::<f32>().is_err());
    }

    #[test]
    fn test_rank_mismatch() {
        let value = NodeValue::from_vec(vec![1.0f32, 2.0]);
        assert!(matches!(
            value.view_as_array::<f32, 2>(),
            Err(ValueError::RankMismatch { requested: 2, actual: 1 })
        ));
        let view = value.view_as_array::<f32, 1>().unwrap();
        assert_eq!(view[[1]], 2.0);
    }

    #[test]
    fn test_array_view_shares_buffer() {
        let mut value = NodeValue::from_literal([[1i64, 2], [3, 4]]).unwrap();
        {
            let mut view = value.view_as_array_mut::<i64, 2>().unwrap();
            view[[1, 0]] = 30;
        }
        assert_eq!(value.get::<i64>(&[1, 0]).unwrap(), Some(30));
        assert_eq!(value.to_string(), "[[1,2],[30,4]]");
    }

    #[test]
    fn test_equality_and_identity() {
        let x = NodeValue::from_vec(vec![1i32, 2]);
        let mut copy = vec![1i32, 2];
        let y = unsafe { NodeValue::view_of(&mut copy) };
        assert!(!y.is_owner());
        assert_eq!(x, y);
        assert!(!same_buffer(&x, &y));

        let alias = unsafe { x.alias() };
        assert!(same_buffer(&x, &alias));
        assert_eq!(x, alias);
    }

    #[test]
    fn test_inequality() {
        let a = NodeValue::from_vec(vec![1i32, 2]);
        assert_ne!(a, NodeValue::from_vec(vec![1i32, 3]));
        assert_ne!(a, NodeValue::from_vec(vec![1i64, 2]));
        assert_ne!(a, NodeValue::from_array([2, 1], vec![1i32, 2]).unwrap());
        assert_ne!(a, NodeValue::empty());
    }

    #[test]
    fn test_nan_not_equal() {
        let a = NodeValue::from_vec(vec![f64::NAN]);
        let b = NodeValue::from_vec(vec![f64::NAN]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_deep_copy_owns() {
        let mut data = vec![4.0f32, 5.0];
        let view = unsafe { NodeValue::view_of(&mut data) };
        let copy = view.deep_copy();
        assert!(copy.is_owner());
        assert_eq!(copy, view);
        assert!(!same_buffer(&copy, &view));
    }

    #[test]
    fn test_reshape() {
        let mut value = NodeValue::from_vec((0..6).collect::<Vec<i32>>());
        value.reshape([3, 2]).unwrap();
        assert_eq!(value.get::<i32>(&[0, 1]).unwrap(), Some(3));
        assert!(value.reshape([4, 2]).is_err());
        assert!(NodeValue::empty().reshape([1]).is_err());
    }

    #[test]
    fn test_visit_dispatches_on_kind() {
        struct Width;

        impl ValueVisitor for Width {
            type Output = usize;

            fn visit<T: Scalar>(self, _data: &[T], _shape: &Shape) -> usize {
                T::KIND.byte_width()
            }

            fn visit_empty(self) -> usize {
                0
            }
        }

        assert_eq!(NodeValue::from(1i64).visit(Width), 8);
        assert_eq!(NodeValue::from("a").visit(Width), 1);
        assert_eq!(NodeValue::empty().visit(Width), 0);
    }

    #[test]
    fn test_copy_from_raw() {
        let source = [1.5f64, 2.5, 3.5, 4.5];
        let ptr = NonNull::from(&source).cast::<u8>();
        let value = unsafe { NodeValue::copy_from_raw(ScalarKind::Float64, [2, 2], ptr) }.unwrap();
        assert!(value.is_owner());
        assert_eq!(value.as_slice::<f64>().unwrap(), &source);
    }
}
