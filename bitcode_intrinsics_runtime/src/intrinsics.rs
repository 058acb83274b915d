//! Scalar math-library intrinsics
//!
//! These are the reference formulas behind every catalog executor. Single
//! precision variants widen to `f64`, compute there and narrow the result,
//! so `f32` and `f64` call sites share one rounding behaviour.
//!
//! A few formulas are deliberately not the "obvious" native operation
//! (`log2`, `exp2`, `ldexp`); changing them changes observable results.

use crate::error::RuntimeResult;
use crate::extended::Extended80;

// ========== Roots, logarithms and exponentials ==========

/// Square root
#[inline]
pub fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

/// Natural logarithm
#[inline]
pub fn log(x: f64) -> f64 {
    x.ln()
}

/// Base-10 logarithm
#[inline]
pub fn log10(x: f64) -> f64 {
    x.log10()
}

/// Base-2 logarithm, computed as `ln(x) / ln(2)`
#[inline]
pub fn log2(x: f64) -> f64 {
    x.ln() / 2f64.ln()
}

/// Exponential
#[inline]
pub fn exp(x: f64) -> f64 {
    x.exp()
}

/// Base-2 exponential, computed as `pow(2, x)`
#[inline]
pub fn exp2(x: f64) -> f64 {
    2f64.powf(x)
}

/// `value * 2^exp`, rounded as a multiplication (not as `scalbn`)
#[inline]
pub fn ldexp(value: f64, exp: i32) -> f64 {
    value * 2f64.powf(exp as f64)
}

// ========== Rounding ==========

#[inline]
pub fn floor(x: f64) -> f64 {
    x.floor()
}

#[inline]
pub fn ceil(x: f64) -> f64 {
    x.ceil()
}

/// Round to integral value, ties to even
#[inline]
pub fn rint(x: f64) -> f64 {
    x.round_ties_even()
}

#[inline]
pub fn floor_f32(x: f32) -> f32 {
    x.floor()
}

#[inline]
pub fn ceil_f32(x: f32) -> f32 {
    x.ceil()
}

#[inline]
pub fn rint_f32(x: f32) -> f32 {
    x.round_ties_even()
}

// ========== Trigonometric functions ==========

#[inline]
pub fn sin(x: f64) -> f64 {
    x.sin()
}

#[inline]
pub fn cos(x: f64) -> f64 {
    x.cos()
}

#[inline]
pub fn tan(x: f64) -> f64 {
    x.tan()
}

#[inline]
pub fn asin(x: f64) -> f64 {
    x.asin()
}

#[inline]
pub fn acos(x: f64) -> f64 {
    x.acos()
}

#[inline]
pub fn atan(x: f64) -> f64 {
    x.atan()
}

#[inline]
pub fn sinh(x: f64) -> f64 {
    x.sinh()
}

#[inline]
pub fn cosh(x: f64) -> f64 {
    x.cosh()
}

#[inline]
pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Arctangent of y/x
#[inline]
pub fn atan2(y: f64, x: f64) -> f64 {
    y.atan2(x)
}

/// Arctangent of y/x in single precision
#[inline]
pub fn atan2_f32(y: f32, x: f32) -> f32 {
    (y as f64).atan2(x as f64) as f32
}

/// Run a double precision unary formula on a single precision operand
#[inline]
pub fn widen_f32(f: fn(f64) -> f64, x: f32) -> f32 {
    f(x as f64) as f32
}

// ========== Sign and magnitude ==========

/// Absolute value of an `i32`
///
/// `i32::MIN` has no positive counterpart: this overflows, panicking in
/// debug builds. Release behaviour is unspecified.
#[inline]
pub fn abs_i32(x: i32) -> i32 {
    x.abs()
}

/// Absolute value of an `i64`; `i64::MIN` overflows like [`abs_i32`]
#[inline]
pub fn abs_i64(x: i64) -> i64 {
    x.abs()
}

#[inline]
pub fn copysign(magnitude: f64, sign: f64) -> f64 {
    magnitude.copysign(sign)
}

#[inline]
pub fn copysign_f32(magnitude: f32, sign: f32) -> f32 {
    magnitude.copysign(sign)
}

// ========== Powers ==========

/// Double raised to a double
#[inline]
pub fn pow(base: f64, exponent: f64) -> f64 {
    base.powf(exponent)
}

/// Double raised to an integer; the exponent is widened, not repeated-multiplied
#[inline]
pub fn pow_i32(base: f64, exponent: i32) -> f64 {
    base.powf(exponent as f64)
}

#[inline]
pub fn pow_f32(base: f32, exponent: f32) -> f32 {
    (base as f64).powf(exponent as f64) as f32
}

#[inline]
pub fn pow_f32_i32(base: f32, exponent: i32) -> f32 {
    (base as f64).powf(exponent as f64) as f32
}

/// Extended-precision base raised to an integer
#[inline]
pub fn pow_extended_i32(base: &Extended80, exponent: i32) -> Extended80 {
    base.powi(exponent)
}

/// Extended-precision base raised to an extended exponent
#[inline]
pub fn pow_extended(base: &Extended80, exponent: &Extended80) -> RuntimeResult<Extended80> {
    base.pow(exponent)
}

// ========== Remainders ==========

/// IEEE 754 remainder: `x - n * y` where `n` is `x / y` rounded to nearest, ties to even
///
/// The result lies in `[-|y|/2, |y|/2]` and carries the sign of `x` when zero.
pub fn ieee_remainder(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() || x.is_infinite() || y == 0.0 {
        return f64::NAN;
    }
    if y.is_infinite() {
        return x;
    }

    let negative = x.is_sign_negative();
    let p = y.abs();
    // reduce into [0, 2p) first so the halving steps below are exact
    let mut r = if p <= f64::MAX / 2.0 { x % (p + p) } else { x };
    if r.abs() == p {
        return 0.0 * x;
    }
    r = r.abs();
    if p < 2.0 * f64::MIN_POSITIVE {
        if r + r > p {
            r -= p;
            if r + r >= p {
                r -= p;
            }
        }
    } else {
        let half = 0.5 * p;
        if r > half {
            r -= p;
            if r >= half {
                r -= p;
            }
        }
    }
    if negative {
        -r
    } else {
        r
    }
}

/// Double remainder with the zero-divisor policy: `fmod(x, 0) == 0`
///
/// A zero divisor is a defined result rather than a trap or NaN.
#[inline]
pub fn fmod(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    ieee_remainder(numerator, denominator)
}

/// Extended-precision remainder with the same zero-divisor policy as [`fmod`]
pub fn fmod_extended(numerator: &Extended80, denominator: &Extended80) -> Extended80 {
    if denominator.is_zero() {
        return Extended80::zero();
    }
    numerator.rem(denominator)
}

// ========== Integral/fractional split ==========

/// Result of splitting a double into integral and fractional parts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModfParts {
    /// Integral part, truncated toward zero
    pub integral: f64,
    /// `x - integral`
    pub fractional: f64,
}

/// Split `x` into integral and fractional parts
///
/// The integral part is derived from the IEEE remainder by 1, pulled back
/// toward zero when the remainder rounded away from it. Nonzero parts carry
/// the sign of `x`. A zero integral part is always `+0.0`, so `-0.5` splits
/// into `+0.0` and `-0.5`; the fractional part of a negative whole number is
/// `+0.0` as well. Infinities split into themselves and a signed zero; NaN
/// splits into NaN twice.
pub fn modf_split(x: f64) -> ModfParts {
    if x.is_nan() {
        return ModfParts {
            integral: x,
            fractional: x,
        };
    }
    if x.is_infinite() {
        return ModfParts {
            integral: x,
            fractional: 0f64.copysign(x),
        };
    }

    let mut remainder = ieee_remainder(x, 1.0);
    if x > 0.0 && remainder < 0.0 {
        remainder += 1.0;
    } else if x < 0.0 && remainder > 0.0 {
        remainder -= 1.0;
    }
    let integral = x - remainder;
    ModfParts {
        integral,
        fractional: x - integral,
    }
}
