//! Extended-precision (x87 80-bit) floating point
//!
//! The engine treats the 80-bit type as opaque: it only needs arithmetic,
//! remainder, power, absolute value, sign-copy, comparison and a zero test.
//! Values are carried as an `astro_float::BigFloat` pinned to the x87
//! significand width and rounded to nearest-even after every operation.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;

use astro_float::{BigFloat, Consts, RoundingMode};

use crate::error::{RuntimeError, RuntimeResult};

/// Significand width of the x87 extended format, in bits
pub const EXTENDED_PRECISION: usize = 64;

const ROUNDING: RoundingMode = RoundingMode::ToEven;

/// 2^64: lifts every subnormal double into the normal range
const SUBNORMAL_SCALE: f64 = 18446744073709551616.0;

thread_local! {
    // Constant cache required by astro-float for transcendental `pow`.
    static CONSTS: RefCell<Option<Consts>> = const { RefCell::new(None) };
}

fn with_consts<T>(f: impl FnOnce(&mut Consts) -> T) -> RuntimeResult<T> {
    CONSTS.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            let consts = Consts::new().map_err(|e| {
                RuntimeError::internal(format!(
                    "Failed to initialize extended-precision constants: {:?}",
                    e
                ))
            })?;
            *slot = Some(consts);
        }
        match slot.as_mut() {
            Some(consts) => Ok(f(consts)),
            None => Err(RuntimeError::internal(
                "extended-precision constants missing after initialization",
            )),
        }
    })
}

/// 80-bit extended-precision float
#[derive(Debug, Clone)]
pub struct Extended80(BigFloat);

impl Extended80 {
    /// Positive zero
    pub fn zero() -> Self {
        Extended80(BigFloat::from_f64(0.0, EXTENDED_PRECISION))
    }

    /// Exact conversion from a double
    ///
    /// Subnormal doubles are normal in the extended format. Both infinities,
    /// NaN and the sign of zero are kept.
    pub fn from_f64(value: f64) -> Self {
        if value == 0.0 {
            let zero = BigFloat::from_f64(0.0, EXTENDED_PRECISION);
            return if value.is_sign_negative() {
                Extended80(zero.neg())
            } else {
                Extended80(zero)
            };
        }
        if value.is_subnormal() {
            let scaled = BigFloat::from_f64(value * SUBNORMAL_SCALE, EXTENDED_PRECISION);
            let scale = BigFloat::from_f64(SUBNORMAL_SCALE, EXTENDED_PRECISION);
            return Extended80(scaled.div(&scale, EXTENDED_PRECISION, ROUNDING));
        }
        Extended80(BigFloat::from_f64(value, EXTENDED_PRECISION))
    }

    /// Exact conversion from a 32-bit integer
    pub fn from_i32(value: i32) -> Self {
        // every i32 is exactly representable as f64
        Self::from_f64(value as f64)
    }

    /// Round to the nearest double
    pub fn to_f64(&self) -> f64 {
        if self.0.is_nan() {
            return f64::NAN;
        }
        if self.0.is_inf() {
            return if self.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
        }
        if self.is_zero() {
            return if self.is_negative() { -0.0 } else { 0.0 };
        }
        self.0.to_string().parse::<f64>().unwrap_or(f64::NAN)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn add(&self, other: &Self) -> Self {
        Extended80(self.0.add(&other.0, EXTENDED_PRECISION, ROUNDING))
    }

    pub fn sub(&self, other: &Self) -> Self {
        Extended80(self.0.sub(&other.0, EXTENDED_PRECISION, ROUNDING))
    }

    pub fn mul(&self, other: &Self) -> Self {
        Extended80(self.0.mul(&other.0, EXTENDED_PRECISION, ROUNDING))
    }

    pub fn div(&self, other: &Self) -> Self {
        Extended80(self.0.div(&other.0, EXTENDED_PRECISION, ROUNDING))
    }

    /// Truncating remainder; the result carries the sign of `self`
    pub fn rem(&self, other: &Self) -> Self {
        Extended80(self.0.rem(&other.0))
    }

    pub fn abs(&self) -> Self {
        if self.is_zero() {
            return Extended80::zero();
        }
        Extended80(self.0.abs())
    }

    pub fn neg(&self) -> Self {
        Extended80(self.0.neg())
    }

    /// Magnitude of `self` with the sign of `sign`
    pub fn copysign(&self, sign: &Self) -> Self {
        let magnitude = self.abs();
        if sign.is_negative() {
            magnitude.neg()
        } else {
            magnitude
        }
    }

    /// Integer power
    pub fn powi(&self, exponent: i32) -> Self {
        let magnitude = self
            .0
            .powi(exponent.unsigned_abs() as usize, EXTENDED_PRECISION, ROUNDING);
        if exponent < 0 {
            Extended80(magnitude.reciprocal(EXTENDED_PRECISION, ROUNDING))
        } else {
            Extended80(magnitude)
        }
    }

    /// Extended-precision power
    pub fn pow(&self, exponent: &Self) -> RuntimeResult<Self> {
        with_consts(|consts| {
            Extended80(
                self.0
                    .pow(&exponent.0, EXTENDED_PRECISION, ROUNDING, consts),
            )
        })
    }
}

impl Default for Extended80 {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Extended80 {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.0.cmp(&other.0), Some(0))
    }
}

impl PartialOrd for Extended80 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.cmp(&other.0).map(|c| c.cmp(&0))
    }
}

impl From<f64> for Extended80 {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<i32> for Extended80 {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl fmt::Display for Extended80 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
