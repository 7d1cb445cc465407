//! Scalar type domain
//!
//! The closed set of element kinds a node value can hold, their string codes,
//! and the dispatch primitive every kind-polymorphic algorithm goes through.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ValueError, ValueResult};

/// Code reported for a value that holds no data.
pub const EMPTY_CODE: &str = "MT";

/// Element kind of a node value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Single byte character
    #[serde(rename = "C1")]
    Char8,
    #[serde(rename = "I4")]
    Int32,
    #[serde(rename = "I8")]
    Int64,
    #[serde(rename = "R4")]
    Float32,
    #[serde(rename = "R8")]
    Float64,
}

impl ScalarKind {
    /// Every kind, in code order
    pub const ALL: [ScalarKind; 5] = [
        ScalarKind::Char8,
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Float32,
        ScalarKind::Float64,
    ];

    /// Size of one element in bytes
    #[inline]
    pub const fn byte_width(self) -> usize {
        match self {
            ScalarKind::Char8 => 1,
            ScalarKind::Int32 | ScalarKind::Float32 => 4,
            ScalarKind::Int64 | ScalarKind::Float64 => 8,
        }
    }

    /// Canonical two-letter code
    #[inline]
    pub const fn code(self) -> &'static str {
        match self {
            ScalarKind::Char8 => "C1",
            ScalarKind::Int32 => "I4",
            ScalarKind::Int64 => "I8",
            ScalarKind::Float32 => "R4",
            ScalarKind::Float64 => "R8",
        }
    }

    /// Parse a code. `"MT"` is not a scalar kind and is rejected here.
    pub fn from_code(code: &str) -> ValueResult<Self> {
        match code {
            "C1" => Ok(ScalarKind::Char8),
            "I4" => Ok(ScalarKind::Int32),
            "I8" => Ok(ScalarKind::Int64),
            "R4" => Ok(ScalarKind::Float32),
            "R8" => Ok(ScalarKind::Float64),
            other => Err(ValueError::UnknownScalarCode { code: other.to_string() }),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parse a data type code, accepting `"MT"` as the empty state (`None`).
pub fn parse_data_type(code: &str) -> ValueResult<Option<ScalarKind>> {
    if code == EMPTY_CODE {
        Ok(None)
    } else {
        ScalarKind::from_code(code).map(Some)
    }
}

/// Code of an optional kind (`"MT"` for `None`).
pub fn data_type_code(kind: Option<ScalarKind>) -> &'static str {
    kind.map_or(EMPTY_CODE, ScalarKind::code)
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Rust type backing one of the five kinds.
///
/// Sealed: the set of kinds is closed.
pub trait Scalar: sealed::Sealed + Copy + PartialEq + fmt::Debug + fmt::Display + Default + 'static {
    /// Kind this type represents
    const KIND: ScalarKind;
}

impl Scalar for u8 {
    const KIND: ScalarKind = ScalarKind::Char8;
}

impl Scalar for i32 {
    const KIND: ScalarKind = ScalarKind::Int32;
}

impl Scalar for i64 {
    const KIND: ScalarKind = ScalarKind::Int64;
}

impl Scalar for f32 {
    const KIND: ScalarKind = ScalarKind::Float32;
}

impl Scalar for f64 {
    const KIND: ScalarKind = ScalarKind::Float64;
}

/// Operation instantiated for exactly one concrete kind by [`dispatch`].
pub trait KindOp {
    type Output;

    fn call<T: Scalar>(self) -> Self::Output;
}

/// Run `op` instantiated for the Rust type matching `kind`.
pub fn dispatch<O: KindOp>(kind: ScalarKind, op: O) -> O::Output {
    match kind {
        ScalarKind::Char8 => op.call::<u8>(),
        ScalarKind::Int32 => op.call::<i32>(),
        ScalarKind::Int64 => op.call::<i64>(),
        ScalarKind::Float32 => op.call::<f32>(),
        ScalarKind::Float64 => op.call::<f64>(),
    }
}

/// [`dispatch`] keyed by string code. Fails on unknown codes and on `"MT"`.
pub fn dispatch_code<O: KindOp>(code: &str, op: O) -> ValueResult<O::Output> {
    let kind = ScalarKind::from_code(code)?;
    Ok(dispatch(kind, op))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record<'a>(&'a mut Vec<ScalarKind>);

    impl KindOp for Record<'_> {
        type Output = usize;

        fn call<T: Scalar>(self) -> usize {
            self.0.push(T::KIND);
            std::mem::size_of::<T>()
        }
    }

    #[test]
    fn test_code_round_trip() {
        for kind in ScalarKind::ALL {
            assert_eq!(ScalarKind::from_code(kind.code()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_code() {
        assert!(matches!(
            ScalarKind::from_code("X9"),
            Err(ValueError::UnknownScalarCode { .. })
        ));
        assert!(ScalarKind::from_code(EMPTY_CODE).is_err());
        assert_eq!(parse_data_type(EMPTY_CODE).unwrap(), None);
        assert_eq!(data_type_code(None), "MT");
    }

    #[test]
    fn test_dispatch_i8_only_once() {
        let mut seen = Vec::new();
        let width = dispatch_code("I8", Record(&mut seen)).unwrap();
        assert_eq!(seen, vec![ScalarKind::Int64]);
        assert_eq!(width, 8);
    }

    #[test]
    fn test_dispatch_width_matches_type() {
        for kind in ScalarKind::ALL {
            let mut seen = Vec::new();
            assert_eq!(dispatch(kind, Record(&mut seen)), kind.byte_width());
            assert_eq!(seen, vec![kind]);
        }
    }

    #[test]
    fn test_dispatch_empty_rejected() {
        let mut seen = Vec::new();
        assert!(dispatch_code("MT", Record(&mut seen)).is_err());
        assert!(seen.is_empty());
    }
}
