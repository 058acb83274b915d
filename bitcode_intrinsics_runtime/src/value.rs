//! Numeric value domain for intrinsic dispatch
//!
//! This module provides the `NumericValue` enum handed to intrinsics at
//! call sites whose operand types are only known at run time, and the
//! payload-free `ValueKind` tag that type guards compare.

use std::fmt;

use crate::extended::Extended80;
use crate::memory::Address;
use crate::vector::Vector;

/// Dynamically typed numeric operand or result
///
/// Values have copy semantics: vectors share immutable lane storage, so
/// cloning never exposes mutation to another holder.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    // ========== Scalars ==========
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// 80-bit extended-precision floating point
    Extended80(Extended80),

    // ========== Vectors ==========
    /// Fixed-length vector of 32-bit floats
    VectorF32(Vector<f32>),
    /// Fixed-length vector of 64-bit floats
    VectorF64(Vector<f64>),
    /// Fixed-length vector of booleans (lane-wise comparison results)
    VectorBool(Vector<bool>),

    // ========== Pointers ==========
    /// Raw address (writable target of pointer-writeback intrinsics)
    Pointer(Address),
}

/// Runtime type tag of a [`NumericValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int32,
    Int64,
    Float32,
    Float64,
    Extended80,
    VectorF32,
    VectorF64,
    VectorBool,
    Pointer,
}

impl ValueKind {
    /// Bitcode-level type name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Int32 => "i32",
            ValueKind::Int64 => "i64",
            ValueKind::Float32 => "float",
            ValueKind::Float64 => "double",
            ValueKind::Extended80 => "x86_fp80",
            ValueKind::VectorF32 => "<N x float>",
            ValueKind::VectorF64 => "<N x double>",
            ValueKind::VectorBool => "<N x i1>",
            ValueKind::Pointer => "ptr",
        }
    }

    /// Check if this is a scalar floating point kind
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            ValueKind::Float32 | ValueKind::Float64 | ValueKind::Extended80
        )
    }

    /// Check if this is a vector kind
    pub fn is_vector(&self) -> bool {
        matches!(
            self,
            ValueKind::VectorF32 | ValueKind::VectorF64 | ValueKind::VectorBool
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl NumericValue {
    /// Runtime type tag of this value
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            NumericValue::Int32(_) => ValueKind::Int32,
            NumericValue::Int64(_) => ValueKind::Int64,
            NumericValue::Float32(_) => ValueKind::Float32,
            NumericValue::Float64(_) => ValueKind::Float64,
            NumericValue::Extended80(_) => ValueKind::Extended80,
            NumericValue::VectorF32(_) => ValueKind::VectorF32,
            NumericValue::VectorF64(_) => ValueKind::VectorF64,
            NumericValue::VectorBool(_) => ValueKind::VectorBool,
            NumericValue::Pointer(_) => ValueKind::Pointer,
        }
    }

    /// Bitcode-level type name of this value
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Try to extract as i32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            NumericValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumericValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as f32
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            NumericValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumericValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as an extended-precision reference
    pub fn as_extended(&self) -> Option<&Extended80> {
        match self {
            NumericValue::Extended80(v) => Some(v),
            _ => None,
        }
    }

    /// Try to extract as an address
    pub fn as_pointer(&self) -> Option<Address> {
        match self {
            NumericValue::Pointer(a) => Some(*a),
            _ => None,
        }
    }

    /// Bit-level identity: equal kinds and identical payload bits
    ///
    /// Unlike `==`, NaN payloads compare equal to themselves and `0.0` is
    /// distinguished from `-0.0`.
    pub fn bit_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NumericValue::Float32(a), NumericValue::Float32(b)) => a.to_bits() == b.to_bits(),
            (NumericValue::Float64(a), NumericValue::Float64(b)) => a.to_bits() == b.to_bits(),
            (NumericValue::VectorF32(a), NumericValue::VectorF32(b)) => {
                a.len() == b.len()
                    && a.values()
                        .iter()
                        .zip(b.values())
                        .all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (NumericValue::VectorF64(a), NumericValue::VectorF64(b)) => {
                a.len() == b.len()
                    && a.values()
                        .iter()
                        .zip(b.values())
                        .all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (NumericValue::Extended80(a), NumericValue::Extended80(b)) => {
                (a.is_nan() && b.is_nan())
                    || (a == b && a.is_negative() == b.is_negative())
            }
            _ => self == other,
        }
    }
}

// ========== From implementations ==========

impl From<i32> for NumericValue {
    fn from(v: i32) -> Self {
        NumericValue::Int32(v)
    }
}

impl From<i64> for NumericValue {
    fn from(v: i64) -> Self {
        NumericValue::Int64(v)
    }
}

impl From<f32> for NumericValue {
    fn from(v: f32) -> Self {
        NumericValue::Float32(v)
    }
}

impl From<f64> for NumericValue {
    fn from(v: f64) -> Self {
        NumericValue::Float64(v)
    }
}

impl From<Extended80> for NumericValue {
    fn from(v: Extended80) -> Self {
        NumericValue::Extended80(v)
    }
}

impl From<Vector<f32>> for NumericValue {
    fn from(v: Vector<f32>) -> Self {
        NumericValue::VectorF32(v)
    }
}

impl From<Vector<f64>> for NumericValue {
    fn from(v: Vector<f64>) -> Self {
        NumericValue::VectorF64(v)
    }
}

impl From<Vector<bool>> for NumericValue {
    fn from(v: Vector<bool>) -> Self {
        NumericValue::VectorBool(v)
    }
}

impl From<Address> for NumericValue {
    fn from(a: Address) -> Self {
        NumericValue::Pointer(a)
    }
}

// ========== Display implementation ==========

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Int32(v) => write!(f, "{}", v),
            NumericValue::Int64(v) => write!(f, "{}", v),
            NumericValue::Float32(v) => write!(f, "{:?}f", v),
            NumericValue::Float64(v) => write!(f, "{:?}", v),
            NumericValue::Extended80(v) => write!(f, "{}L", v),
            NumericValue::VectorF32(v) => write!(f, "{}", v),
            NumericValue::VectorF64(v) => write!(f, "{}", v),
            NumericValue::VectorBool(v) => write!(f, "{}", v),
            NumericValue::Pointer(a) => write!(f, "{}", a),
        }
    }
}
