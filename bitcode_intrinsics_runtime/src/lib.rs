//! Bitcode Intrinsics Runtime Library
//!
//! This crate provides the value domain shared by the intrinsic dispatch
//! engine. It includes:
//!
//! - `NumericValue` enum for dynamically typed operands
//! - `Vector<T>` fixed-length lane vectors
//! - `Extended80` extended-precision floats
//! - `RuntimeError` for error handling
//! - Scalar math-library formulas
//! - The `Memory` capability used by pointer-writeback intrinsics

pub mod error;
pub mod extended;
pub mod intrinsics;
pub mod memory;
pub mod value;
pub mod vector;

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use bitcode_intrinsics_runtime::prelude::*;
///
/// let v = NumericValue::from(2.0f64);
/// assert_eq!(v.kind(), ValueKind::Float64);
/// ```
pub mod prelude {
    pub use super::error::{RuntimeError, RuntimeResult};
    pub use super::extended::Extended80;
    pub use super::memory::{store_extended_array, Address, Memory, MemoryFault, NoMemory};
    pub use super::value::{NumericValue, ValueKind};
    pub use super::vector::Vector;
}

pub use prelude::*;
