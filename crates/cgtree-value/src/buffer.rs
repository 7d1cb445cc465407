//! Ownership-aware memory buffer
//!
//! A `Buffer` is a contiguous byte region that either owns its memory (and
//! frees it exactly once) or borrows memory owned elsewhere. Ownership can be
//! handed off with [`Buffer::take_ownership`] or the two-step
//! [`Buffer::deallocator`] + [`Buffer::release`] protocol.

use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

use crate::Scalar;

/// Capability to free a region of memory.
///
/// `Copy` so that a prospective new owner can obtain it before the current
/// owner releases. Whoever holds ownership at drop time must call it once.
#[derive(Clone, Copy)]
pub struct Deallocator {
    free: unsafe fn(NonNull<u8>, usize),
    context: usize,
}

impl Deallocator {
    /// Wrap a foreign free routine. `context` is passed back on every call.
    pub const fn new(free: unsafe fn(NonNull<u8>, usize), context: usize) -> Self {
        Self { free, context }
    }

    /// Deallocator for memory that came out of a `Vec<T>` with `capacity`.
    pub(crate) fn for_vec<T>(capacity: usize) -> Self {
        Self::new(free_vec::<T>, capacity)
    }

    /// Free `ptr`.
    ///
    /// # Safety
    /// `ptr` must be the region this deallocator was created for, and it must
    /// not have been freed already.
    pub unsafe fn deallocate(self, ptr: NonNull<u8>) {
        unsafe { (self.free)(ptr, self.context) }
    }
}

impl fmt::Debug for Deallocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deallocator")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

unsafe fn free_vec<T>(ptr: NonNull<u8>, capacity: usize) {
    // Length 0: elements are plain scalars, nothing to drop.
    drop(unsafe { Vec::from_raw_parts(ptr.cast::<T>().as_ptr(), 0, capacity) });
}

/// Who is responsible for freeing the buffer
#[derive(Debug, Clone, Copy)]
enum Ownership {
    Owned(Deallocator),
    Borrowed,
}

/// Contiguous memory region with an ownership state
pub struct Buffer {
    ptr: NonNull<u8>,
    /// Length in bytes
    len: usize,
    ownership: Ownership,
}

impl Buffer {
    /// Zero-length borrowed buffer
    pub fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            ownership: Ownership::Borrowed,
        }
    }

    /// Take over the allocation of `items`.
    pub fn from_vec<T: Scalar>(items: Vec<T>) -> Self {
        let mut items = ManuallyDrop::new(items);
        let capacity = items.capacity();
        let len = items.len() * std::mem::size_of::<T>();
        let ptr = NonNull::from(items.as_mut_slice()).cast::<u8>();
        Self {
            ptr,
            len,
            ownership: Ownership::Owned(Deallocator::for_vec::<T>(capacity)),
        }
    }

    /// Adopt memory owned by someone else, becoming its owner.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` bytes until
    /// `deallocator` is invoked, and `deallocator` must free exactly that
    /// region. No other party may free it.
    pub unsafe fn from_raw_owned(ptr: NonNull<u8>, len: usize, deallocator: Deallocator) -> Self {
        Self {
            ptr,
            len,
            ownership: Ownership::Owned(deallocator),
        }
    }

    /// Non-owning view of memory owned elsewhere.
    ///
    /// # Safety
    /// `ptr` must be valid for reads (and writes, if the buffer is written
    /// through) of `len` bytes for as long as this buffer or anything built
    /// on it is used.
    pub unsafe fn borrowed(ptr: NonNull<u8>, len: usize) -> Self {
        Self {
            ptr,
            len,
            ownership: Ownership::Borrowed,
        }
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether dropping this buffer frees its memory
    #[inline]
    pub fn is_owner(&self) -> bool {
        matches!(self.ownership, Ownership::Owned(_))
    }

    /// Capability a new owner needs to free the memory later.
    ///
    /// `None` when the buffer does not own its memory.
    pub fn deallocator(&self) -> Option<Deallocator> {
        match self.ownership {
            Ownership::Owned(dealloc) => Some(dealloc),
            Ownership::Borrowed => None,
        }
    }

    /// Give up ownership. Returns whether the buffer was an owner.
    ///
    /// The caller becomes responsible for freeing the memory, typically with a
    /// [`Deallocator`] obtained beforehand. A second call returns `false`.
    pub fn release(&mut self) -> bool {
        self.take_ownership().is_some()
    }

    /// Give up ownership and hand back the capability in one step.
    pub fn take_ownership(&mut self) -> Option<Deallocator> {
        match std::mem::replace(&mut self.ownership, Ownership::Borrowed) {
            Ownership::Owned(dealloc) => {
                tracing::trace!("Buffer {:p} ({} bytes) released", self.ptr, self.len);
                Some(dealloc)
            }
            Ownership::Borrowed => None,
        }
    }

    /// Raw pointer to the first byte, valid regardless of ownership state
    #[inline]
    pub fn data(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn data_mut(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    pub fn as_bytes(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Whether both buffers start at the same address and cover the same bytes
    pub fn same_memory(&self, other: &Buffer) -> bool {
        self.ptr == other.ptr && self.len == other.len
    }

    /// Reinterpret the bytes as `T`s.
    ///
    /// # Safety
    /// The buffer must hold `len / size_of::<T>()` valid, aligned `T`s.
    pub(crate) unsafe fn as_typed<T: Scalar>(&self) -> &[T] {
        let count = self.len / std::mem::size_of::<T>();
        if count == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr.cast::<T>().as_ptr(), count) }
    }

    /// # Safety
    /// Same as [`Buffer::as_typed`], and no other live view may alias it.
    pub(crate) unsafe fn as_typed_mut<T: Scalar>(&mut self) -> &mut [T] {
        let count = self.len / std::mem::size_of::<T>();
        if count == 0 {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.ptr.cast::<T>().as_ptr(), count) }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Ownership::Owned(dealloc) = self.ownership {
            self.ownership = Ownership::Borrowed;
            tracing::trace!("Freeing buffer {:p} ({} bytes)", self.ptr, self.len);
            unsafe { dealloc.deallocate(self.ptr) };
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("owner", &self.is_owner())
            .finish()
    }
}
