//! Foreign dense-array boundary
//!
//! Conversion between node values and the array descriptor a hosting numeric
//! runtime understands. Exporting an owning value moves its deallocation
//! capability into a [`Capsule`] that the host finalizes exactly once;
//! importing either views the foreign memory or copies it.

use std::fmt;
use std::ptr::NonNull;

use crate::buffer::Deallocator;
use crate::{NodeValue, ScalarKind, Shape, ValueError, ValueResult};

/// Host type code for each kind (numpy typestr kinds, native byte order)
pub fn foreign_code(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Char8 => "S1",
        ScalarKind::Int32 => "i4",
        ScalarKind::Int64 => "i8",
        ScalarKind::Float32 => "f4",
        ScalarKind::Float64 => "f8",
    }
}

/// Kind for a host type code. A leading byte-order mark (`|`, `<`, `=`) is
/// accepted.
pub fn kind_from_foreign(code: &str) -> ValueResult<ScalarKind> {
    let bare = code.strip_prefix(['|', '<', '=']).unwrap_or(code);
    match bare {
        "S1" => Ok(ScalarKind::Char8),
        "i4" => Ok(ScalarKind::Int32),
        "i8" => Ok(ScalarKind::Int64),
        "f4" => Ok(ScalarKind::Float32),
        "f8" => Ok(ScalarKind::Float64),
        _ => Err(ValueError::UnsupportedForeignType { code: code.to_string() }),
    }
}

/// Dense array as described by the host runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignArray {
    pub type_code: String,
    /// Extents per dimension
    pub shape: Vec<usize>,
    pub data: *mut u8,
    /// Column-major contiguous storage
    pub fortran_contiguous: bool,
}

/// How to treat foreign memory on import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Non-owning view, zero copy
    #[default]
    View,
    /// Fresh owning copy
    Copy,
}

/// One-shot handle carrying the right to free an exported buffer.
///
/// Finalized either explicitly or on drop; never twice.
pub struct Capsule {
    ptr: NonNull<u8>,
    dealloc: Option<Deallocator>,
}

impl Capsule {
    fn new(ptr: NonNull<u8>, dealloc: Deallocator) -> Self {
        tracing::debug!("Capsule created for buffer {:p}", ptr);
        Self {
            ptr,
            dealloc: Some(dealloc),
        }
    }

    /// Address of the memory this capsule frees
    pub fn data(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Free the memory now
    pub fn finalize(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(dealloc) = self.dealloc.take() {
            tracing::debug!("Capsule finalizing buffer {:p}", self.ptr);
            unsafe { dealloc.deallocate(self.ptr) };
        }
    }
}

impl Drop for Capsule {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capsule")
            .field("ptr", &self.ptr)
            .field("pending", &self.dealloc.is_some())
            .finish()
    }
}

/// Result of handing a value to the host
#[derive(Debug)]
pub struct ExportedArray {
    pub array: ForeignArray,
    /// Present when the exported value owned its memory
    pub capsule: Option<Capsule>,
}

fn describe(kind: ScalarKind, shape: &Shape, data: *mut u8) -> ForeignArray {
    ForeignArray {
        type_code: foreign_code(kind).to_string(),
        shape: shape.extents().to_vec(),
        data,
        fortran_contiguous: true,
    }
}

/// Describe a value for the host without transferring ownership.
///
/// The descriptor is valid only while `value` lives.
pub fn describe_foreign(value: &NodeValue) -> ValueResult<ForeignArray> {
    let kind = value.kind().ok_or_else(|| ValueError::UnsupportedForeignType {
        code: value.data_type().to_string(),
    })?;
    Ok(describe(kind, value.shape(), value.buffer().data().cast_mut()))
}

/// Hand a value to the host.
///
/// An owning value gives up its deallocation capability to the returned
/// capsule. A borrowing value yields no capsule: the memory's real owner stays
/// responsible for it.
pub fn export_foreign(value: NodeValue) -> ValueResult<ExportedArray> {
    let (kind, shape, mut buffer) = value.into_parts();
    let kind = kind.ok_or_else(|| ValueError::UnsupportedForeignType {
        code: crate::scalar::EMPTY_CODE.to_string(),
    })?;
    let array = describe(kind, &shape, buffer.data_mut());
    let capsule = buffer
        .take_ownership()
        .map(|dealloc| Capsule::new(buffer.as_non_null(), dealloc));
    tracing::debug!(
        "Exported {} array [{}] ({})",
        kind,
        shape,
        if capsule.is_some() { "owned" } else { "borrowed" }
    );
    Ok(ExportedArray { array, capsule })
}

/// Build a node value from a host array.
///
/// # Safety
/// `array.data` must point to `product(shape)` aligned elements of the
/// described type. In [`ImportMode::View`] the memory must outlive the value.
pub unsafe fn import_foreign(array: &ForeignArray, mode: ImportMode) -> ValueResult<NodeValue> {
    let kind = kind_from_foreign(&array.type_code)?;
    let shape = Shape::from(array.shape.clone());
    if !array.fortran_contiguous && !shape.is_linear() {
        return Err(ValueError::NotColumnMajor { shape });
    }
    let ptr = match NonNull::new(array.data) {
        Some(ptr) => ptr,
        None if shape.element_count() == 0 => NonNull::dangling(),
        None => {
            return Err(ValueError::InvalidShape {
                elements: 0,
                shape,
            });
        }
    };
    tracing::debug!("Importing {} array [{}] as {:?}", kind, shape, mode);
    match mode {
        ImportMode::View => unsafe { NodeValue::from_raw_view(kind, shape, ptr) },
        ImportMode::Copy => unsafe { NodeValue::copy_from_raw(kind, shape, ptr) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::same_buffer;

    #[test]
    fn test_codes_round_trip() {
        for kind in ScalarKind::ALL {
            assert_eq!(kind_from_foreign(foreign_code(kind)).unwrap(), kind);
        }
        assert_eq!(kind_from_foreign("<f8").unwrap(), ScalarKind::Float64);
        assert_eq!(kind_from_foreign("|S1").unwrap(), ScalarKind::Char8);
    }

    #[test]
    fn test_unsupported_code() {
        assert!(matches!(
            kind_from_foreign("c16"),
            Err(ValueError::UnsupportedForeignType { .. })
        ));
    }

    #[test]
    fn test_export_owned_yields_capsule() {
        let value = NodeValue::from_literal(vec![vec![1i32, 2], vec![3, 4]]).unwrap();
        let exported = export_foreign(value).unwrap();
        assert_eq!(exported.array.type_code, "i4");
        assert_eq!(exported.array.shape, vec![2, 2]);
        assert!(exported.array.fortran_contiguous);

        let capsule = exported.capsule.unwrap();
        assert_eq!(capsule.data(), exported.array.data as *const u8);
        let seen = unsafe { std::slice::from_raw_parts(exported.array.data as *const i32, 4) };
        assert_eq!(seen, &[1, 3, 2, 4]);
        capsule.finalize();
    }

    #[test]
    fn test_export_view_has_no_capsule() {
        let mut data = vec![1.0f32, 2.0];
        let view = unsafe { NodeValue::view_of(&mut data) };
        let exported = export_foreign(view).unwrap();
        assert!(exported.capsule.is_none());
        assert_eq!(data, vec![1.0, 2.0]);
    }

    #[test]
    fn test_export_empty_fails() {
        assert!(export_foreign(NodeValue::empty()).is_err());
        assert!(describe_foreign(&NodeValue::empty()).is_err());
    }

    #[test]
    fn test_import_view_and_copy() {
        let owner = NodeValue::from_vec(vec![5i64, 6, 7]);
        let array = describe_foreign(&owner).unwrap();

        let view = unsafe { import_foreign(&array, ImportMode::View) }.unwrap();
        assert!(!view.is_owner());
        assert!(same_buffer(&view, &owner));
        assert_eq!(view, owner);

        let copy = unsafe { import_foreign(&array, ImportMode::Copy) }.unwrap();
        assert!(copy.is_owner());
        assert!(!same_buffer(&copy, &owner));
        assert_eq!(copy, owner);
    }

    #[test]
    fn test_import_rejects_row_major() {
        let owner = NodeValue::from_array([2, 2], vec![1.0f64; 4]).unwrap();
        let mut array = describe_foreign(&owner).unwrap();
        array.fortran_contiguous = false;
        assert!(matches!(
            unsafe { import_foreign(&array, ImportMode::View) },
            Err(ValueError::NotColumnMajor { .. })
        ));
    }

    #[test]
    fn test_import_single_row_ignores_contiguity_flag() {
        let owner = NodeValue::from_array([1, 3], vec![1i32, 2, 3]).unwrap();
        let mut array = describe_foreign(&owner).unwrap();
        array.fortran_contiguous = false;
        let view = unsafe { import_foreign(&array, ImportMode::View) }.unwrap();
        assert_eq!(view.shape(), &Shape::from([1, 3]));
        assert_eq!(view, owner);
    }

    #[test]
    fn test_round_trip_through_capsule() {
        let exported = export_foreign(NodeValue::from("Base")).unwrap();
        let value = unsafe { import_foreign(&exported.array, ImportMode::Copy) }.unwrap();
        drop(exported);
        assert_eq!(value.as_text().unwrap(), "Base");
    }
}
