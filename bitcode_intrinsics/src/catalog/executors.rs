//! Specialized executors, one per accepted operand shape.

use bitcode_intrinsics_runtime::intrinsics;
use bitcode_intrinsics_runtime::{Memory, NumericValue, RuntimeError, RuntimeResult};

use super::Operation;

fn operand_mismatch(op: Operation, args: &[NumericValue]) -> RuntimeError {
    RuntimeError::unsupported_operands(op.name(), args.iter().map(|a| a.type_name()))
}

/// Define `f64` and `f32` executors for a unary formula. The `f32` form
/// computes in double precision and narrows.
macro_rules! float_unary {
    ($op:ident, $f64_fn:ident, $f32_fn:ident, $formula:path) => {
        pub(super) fn $f64_fn(
            args: &[NumericValue],
            _memory: &mut dyn Memory,
        ) -> RuntimeResult<NumericValue> {
            match args {
                [NumericValue::Float64(x)] => Ok(NumericValue::Float64($formula(*x))),
                _ => Err(operand_mismatch(Operation::$op, args)),
            }
        }

        pub(super) fn $f32_fn(
            args: &[NumericValue],
            _memory: &mut dyn Memory,
        ) -> RuntimeResult<NumericValue> {
            match args {
                [NumericValue::Float32(x)] => Ok(NumericValue::Float32(intrinsics::widen_f32(
                    $formula, *x,
                ))),
                _ => Err(operand_mismatch(Operation::$op, args)),
            }
        }
    };
}

/// Define scalar and lane-wise executors for a rounding formula.
macro_rules! rounding {
    (
        $op:ident,
        [$f64_fn:ident, $f32_fn:ident, $vf64_fn:ident, $vf32_fn:ident],
        $formula64:path,
        $formula32:path
    ) => {
        pub(super) fn $f64_fn(
            args: &[NumericValue],
            _memory: &mut dyn Memory,
        ) -> RuntimeResult<NumericValue> {
            match args {
                [NumericValue::Float64(x)] => Ok(NumericValue::Float64($formula64(*x))),
                _ => Err(operand_mismatch(Operation::$op, args)),
            }
        }

        pub(super) fn $f32_fn(
            args: &[NumericValue],
            _memory: &mut dyn Memory,
        ) -> RuntimeResult<NumericValue> {
            match args {
                [NumericValue::Float32(x)] => Ok(NumericValue::Float32($formula32(*x))),
                _ => Err(operand_mismatch(Operation::$op, args)),
            }
        }

        pub(super) fn $vf64_fn(
            args: &[NumericValue],
            _memory: &mut dyn Memory,
        ) -> RuntimeResult<NumericValue> {
            match args {
                [NumericValue::VectorF64(v)] => Ok(NumericValue::VectorF64(v.apply($formula64))),
                _ => Err(operand_mismatch(Operation::$op, args)),
            }
        }

        pub(super) fn $vf32_fn(
            args: &[NumericValue],
            _memory: &mut dyn Memory,
        ) -> RuntimeResult<NumericValue> {
            match args {
                [NumericValue::VectorF32(v)] => Ok(NumericValue::VectorF32(v.apply($formula32))),
                _ => Err(operand_mismatch(Operation::$op, args)),
            }
        }
    };
}

/// Define an executor over a fixed two-operand pattern.
macro_rules! binary {
    ($op:ident, $name:ident, $lhs:ident($a:ident), $rhs:ident($b:ident) => $body:expr) => {
        pub(super) fn $name(
            args: &[NumericValue],
            _memory: &mut dyn Memory,
        ) -> RuntimeResult<NumericValue> {
            match args {
                [NumericValue::$lhs($a), NumericValue::$rhs($b)] => $body,
                _ => Err(operand_mismatch(Operation::$op, args)),
            }
        }
    };
}

// ========== Roots, logarithms and exponentials ==========

float_unary!(Sqrt, sqrt_f64, sqrt_f32, intrinsics::sqrt);
float_unary!(Log, log_f64, log_f32, intrinsics::log);
float_unary!(Log2, log2_f64, log2_f32, intrinsics::log2);
float_unary!(Log10, log10_f64, log10_f32, intrinsics::log10);
float_unary!(Exp, exp_f64, exp_f32, intrinsics::exp);
float_unary!(Exp2, exp2_f64, exp2_f32, intrinsics::exp2);

// ========== Trigonometric functions ==========

float_unary!(Sin, sin_f64, sin_f32, intrinsics::sin);
float_unary!(Cos, cos_f64, cos_f32, intrinsics::cos);
float_unary!(Tan, tan_f64, tan_f32, intrinsics::tan);
float_unary!(Asin, asin_f64, asin_f32, intrinsics::asin);
float_unary!(Acos, acos_f64, acos_f32, intrinsics::acos);
float_unary!(Atan, atan_f64, atan_f32, intrinsics::atan);
float_unary!(Sinh, sinh_f64, sinh_f32, intrinsics::sinh);
float_unary!(Cosh, cosh_f64, cosh_f32, intrinsics::cosh);
float_unary!(Tanh, tanh_f64, tanh_f32, intrinsics::tanh);

binary!(Atan2, atan2_f64, Float64(y), Float64(x) => {
    Ok(NumericValue::Float64(intrinsics::atan2(*y, *x)))
});
binary!(Atan2, atan2_f32, Float32(y), Float32(x) => {
    Ok(NumericValue::Float32(intrinsics::atan2_f32(*y, *x)))
});

// ========== Rounding ==========

rounding!(
    Floor,
    [floor_f64, floor_f32, floor_vf64, floor_vf32],
    intrinsics::floor,
    intrinsics::floor_f32
);
rounding!(
    Ceil,
    [ceil_f64, ceil_f32, ceil_vf64, ceil_vf32],
    intrinsics::ceil,
    intrinsics::ceil_f32
);
rounding!(
    Rint,
    [rint_f64, rint_f32, rint_vf64, rint_vf32],
    intrinsics::rint,
    intrinsics::rint_f32
);

// ========== Absolute value and sign ==========

pub(super) fn abs_i32(
    args: &[NumericValue],
    _memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    match args {
        [NumericValue::Int32(x)] => Ok(NumericValue::Int32(intrinsics::abs_i32(*x))),
        _ => Err(operand_mismatch(Operation::Abs, args)),
    }
}

pub(super) fn abs_i64(
    args: &[NumericValue],
    _memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    match args {
        [NumericValue::Int64(x)] => Ok(NumericValue::Int64(intrinsics::abs_i64(*x))),
        _ => Err(operand_mismatch(Operation::Abs, args)),
    }
}

pub(super) fn abs_f32(
    args: &[NumericValue],
    _memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    match args {
        [NumericValue::Float32(x)] => Ok(NumericValue::Float32(x.abs())),
        _ => Err(operand_mismatch(Operation::Abs, args)),
    }
}

pub(super) fn abs_f64(
    args: &[NumericValue],
    _memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    match args {
        [NumericValue::Float64(x)] => Ok(NumericValue::Float64(x.abs())),
        _ => Err(operand_mismatch(Operation::Abs, args)),
    }
}

pub(super) fn abs_extended(
    args: &[NumericValue],
    _memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    match args {
        [NumericValue::Extended80(x)] => Ok(NumericValue::Extended80(x.abs())),
        _ => Err(operand_mismatch(Operation::Abs, args)),
    }
}

pub(super) fn abs_vf32(
    args: &[NumericValue],
    _memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    match args {
        [NumericValue::VectorF32(v)] => Ok(NumericValue::VectorF32(v.apply(f32::abs))),
        _ => Err(operand_mismatch(Operation::Abs, args)),
    }
}

pub(super) fn abs_vf64(
    args: &[NumericValue],
    _memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    match args {
        [NumericValue::VectorF64(v)] => Ok(NumericValue::VectorF64(v.apply(f64::abs))),
        _ => Err(operand_mismatch(Operation::Abs, args)),
    }
}

binary!(Copysign, copysign_f64, Float64(m), Float64(s) => {
    Ok(NumericValue::Float64(intrinsics::copysign(*m, *s)))
});
binary!(Copysign, copysign_f32, Float32(m), Float32(s) => {
    Ok(NumericValue::Float32(intrinsics::copysign_f32(*m, *s)))
});

// ========== Powers and scaling ==========

binary!(Pow, pow_f32_i32, Float32(base), Int32(exp) => {
    Ok(NumericValue::Float32(intrinsics::pow_f32_i32(*base, *exp)))
});
binary!(Pow, pow_f32, Float32(base), Float32(exp) => {
    Ok(NumericValue::Float32(intrinsics::pow_f32(*base, *exp)))
});
binary!(Pow, pow_f64_i32, Float64(base), Int32(exp) => {
    Ok(NumericValue::Float64(intrinsics::pow_i32(*base, *exp)))
});
binary!(Pow, pow_f64, Float64(base), Float64(exp) => {
    Ok(NumericValue::Float64(intrinsics::pow(*base, *exp)))
});
binary!(Pow, pow_extended_i32, Extended80(base), Int32(exp) => {
    Ok(NumericValue::Extended80(intrinsics::pow_extended_i32(base, *exp)))
});
binary!(Pow, pow_extended, Extended80(base), Extended80(exp) => {
    intrinsics::pow_extended(base, exp).map(NumericValue::Extended80)
});

binary!(Ldexp, ldexp_f64_i32, Float64(value), Int32(exp) => {
    Ok(NumericValue::Float64(intrinsics::ldexp(*value, *exp)))
});

// ========== Remainders ==========

binary!(Fmod, fmod_f64, Float64(numer), Float64(denom) => {
    Ok(NumericValue::Float64(intrinsics::fmod(*numer, *denom)))
});
binary!(Fmod, fmod_extended, Extended80(numer), Extended80(denom) => {
    Ok(NumericValue::Extended80(intrinsics::fmod_extended(numer, denom)))
});

/// `modf(x, iptr)`: store the integral part at `iptr`, then return the fractional part
///
/// A memory fault aborts the call before anything is returned.
pub(super) fn modf_f64(
    args: &[NumericValue],
    memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    match args {
        [NumericValue::Float64(x), NumericValue::Pointer(iptr)] => {
            let parts = intrinsics::modf_split(*x);
            memory.write_f64(*iptr, parts.integral)?;
            Ok(NumericValue::Float64(parts.fractional))
        }
        _ => Err(operand_mismatch(Operation::Modf, args)),
    }
}
