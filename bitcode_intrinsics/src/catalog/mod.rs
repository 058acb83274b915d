//! Operation catalog.
//!
//! The fixed set of math-library operations, each defined for a closed set
//! of operand kind combinations. [`resolve`] maps an operation and an exact
//! operand shape to a specialized [`Executor`]; [`execute_generic`] is the
//! uncached path and is defined in terms of [`resolve`], so a specialized
//! call and a generic call on the same operands always agree.

mod executors;

use std::fmt;
use std::str::FromStr;

use bitcode_intrinsics_runtime::{Memory, NumericValue, RuntimeError, RuntimeResult, ValueKind};

/// Specialized implementation of one operation for one operand shape
///
/// The executor trusts that its operands match the shape it was resolved
/// for; a mismatch is reported as [`RuntimeError::UnsupportedOperands`].
pub type Executor = fn(&[NumericValue], &mut dyn Memory) -> RuntimeResult<NumericValue>;

/// Math-library operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Sqrt,
    Log,
    Log2,
    Log10,
    Exp,
    Exp2,
    Floor,
    Ceil,
    Rint,
    Abs,
    Ldexp,
    Modf,
    Fmod,
    Pow,
    Copysign,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Atan2,
}

impl Operation {
    /// Every operation, in declaration order
    pub const ALL: [Operation; 25] = [
        Operation::Sqrt,
        Operation::Log,
        Operation::Log2,
        Operation::Log10,
        Operation::Exp,
        Operation::Exp2,
        Operation::Floor,
        Operation::Ceil,
        Operation::Rint,
        Operation::Abs,
        Operation::Ldexp,
        Operation::Modf,
        Operation::Fmod,
        Operation::Pow,
        Operation::Copysign,
        Operation::Sin,
        Operation::Cos,
        Operation::Tan,
        Operation::Asin,
        Operation::Acos,
        Operation::Atan,
        Operation::Sinh,
        Operation::Cosh,
        Operation::Tanh,
        Operation::Atan2,
    ];

    /// Canonical C math-library name
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Sqrt => "sqrt",
            Operation::Log => "log",
            Operation::Log2 => "log2",
            Operation::Log10 => "log10",
            Operation::Exp => "exp",
            Operation::Exp2 => "exp2",
            Operation::Floor => "floor",
            Operation::Ceil => "ceil",
            Operation::Rint => "rint",
            Operation::Abs => "abs",
            Operation::Ldexp => "ldexp",
            Operation::Modf => "modf",
            Operation::Fmod => "fmod",
            Operation::Pow => "pow",
            Operation::Copysign => "copysign",
            Operation::Sin => "sin",
            Operation::Cos => "cos",
            Operation::Tan => "tan",
            Operation::Asin => "asin",
            Operation::Acos => "acos",
            Operation::Atan => "atan",
            Operation::Sinh => "sinh",
            Operation::Cosh => "cosh",
            Operation::Tanh => "tanh",
            Operation::Atan2 => "atan2",
        }
    }

    /// Look up an operation by name
    ///
    /// Accepts the canonical names plus the typed C spellings `fabs`,
    /// `labs` (for `abs`) and `fmodl` (for `fmod`).
    pub fn from_name(name: &str) -> Option<Operation> {
        match name {
            "fabs" | "labs" => Some(Operation::Abs),
            "fmodl" => Some(Operation::Fmod),
            _ => Operation::ALL.iter().copied().find(|op| op.name() == name),
        }
    }

    /// Number of operands every specialization of this operation takes
    pub fn arity(&self) -> usize {
        match self {
            Operation::Ldexp
            | Operation::Modf
            | Operation::Fmod
            | Operation::Pow
            | Operation::Copysign
            | Operation::Atan2 => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::from_name(s).ok_or_else(|| RuntimeError::unknown_operation(s))
    }
}

/// Error for an operand shape the catalog has no entry for
pub fn unsupported(op: Operation, kinds: &[ValueKind]) -> RuntimeError {
    RuntimeError::unsupported_operands(op.name(), kinds.iter().map(|k| k.name()))
}

/// Resolve the specialized executor for `op` at exactly the shape `kinds`
pub fn resolve(op: Operation, kinds: &[ValueKind]) -> RuntimeResult<Executor> {
    use executors as x;
    use Operation as Op;
    use ValueKind as K;

    let executor: Executor = match (op, kinds) {
        (Op::Sqrt, [K::Float32]) => x::sqrt_f32,
        (Op::Sqrt, [K::Float64]) => x::sqrt_f64,
        (Op::Log, [K::Float32]) => x::log_f32,
        (Op::Log, [K::Float64]) => x::log_f64,
        (Op::Log2, [K::Float32]) => x::log2_f32,
        (Op::Log2, [K::Float64]) => x::log2_f64,
        (Op::Log10, [K::Float32]) => x::log10_f32,
        (Op::Log10, [K::Float64]) => x::log10_f64,
        (Op::Exp, [K::Float32]) => x::exp_f32,
        (Op::Exp, [K::Float64]) => x::exp_f64,
        (Op::Exp2, [K::Float32]) => x::exp2_f32,
        (Op::Exp2, [K::Float64]) => x::exp2_f64,

        (Op::Floor, [K::Float32]) => x::floor_f32,
        (Op::Floor, [K::Float64]) => x::floor_f64,
        (Op::Floor, [K::VectorF32]) => x::floor_vf32,
        (Op::Floor, [K::VectorF64]) => x::floor_vf64,
        (Op::Ceil, [K::Float32]) => x::ceil_f32,
        (Op::Ceil, [K::Float64]) => x::ceil_f64,
        (Op::Ceil, [K::VectorF32]) => x::ceil_vf32,
        (Op::Ceil, [K::VectorF64]) => x::ceil_vf64,
        (Op::Rint, [K::Float32]) => x::rint_f32,
        (Op::Rint, [K::Float64]) => x::rint_f64,
        (Op::Rint, [K::VectorF32]) => x::rint_vf32,
        (Op::Rint, [K::VectorF64]) => x::rint_vf64,

        (Op::Abs, [K::Int32]) => x::abs_i32,
        (Op::Abs, [K::Int64]) => x::abs_i64,
        (Op::Abs, [K::Float32]) => x::abs_f32,
        (Op::Abs, [K::Float64]) => x::abs_f64,
        (Op::Abs, [K::Extended80]) => x::abs_extended,
        (Op::Abs, [K::VectorF32]) => x::abs_vf32,
        (Op::Abs, [K::VectorF64]) => x::abs_vf64,

        (Op::Ldexp, [K::Float64, K::Int32]) => x::ldexp_f64_i32,
        (Op::Modf, [K::Float64, K::Pointer]) => x::modf_f64,
        (Op::Fmod, [K::Float64, K::Float64]) => x::fmod_f64,
        (Op::Fmod, [K::Extended80, K::Extended80]) => x::fmod_extended,

        (Op::Pow, [K::Float32, K::Int32]) => x::pow_f32_i32,
        (Op::Pow, [K::Float32, K::Float32]) => x::pow_f32,
        (Op::Pow, [K::Float64, K::Int32]) => x::pow_f64_i32,
        (Op::Pow, [K::Float64, K::Float64]) => x::pow_f64,
        (Op::Pow, [K::Extended80, K::Int32]) => x::pow_extended_i32,
        (Op::Pow, [K::Extended80, K::Extended80]) => x::pow_extended,

        (Op::Copysign, [K::Float32, K::Float32]) => x::copysign_f32,
        (Op::Copysign, [K::Float64, K::Float64]) => x::copysign_f64,
        (Op::Atan2, [K::Float32, K::Float32]) => x::atan2_f32,
        (Op::Atan2, [K::Float64, K::Float64]) => x::atan2_f64,

        (Op::Sin, [K::Float32]) => x::sin_f32,
        (Op::Sin, [K::Float64]) => x::sin_f64,
        (Op::Cos, [K::Float32]) => x::cos_f32,
        (Op::Cos, [K::Float64]) => x::cos_f64,
        (Op::Tan, [K::Float32]) => x::tan_f32,
        (Op::Tan, [K::Float64]) => x::tan_f64,
        (Op::Asin, [K::Float32]) => x::asin_f32,
        (Op::Asin, [K::Float64]) => x::asin_f64,
        (Op::Acos, [K::Float32]) => x::acos_f32,
        (Op::Acos, [K::Float64]) => x::acos_f64,
        (Op::Atan, [K::Float32]) => x::atan_f32,
        (Op::Atan, [K::Float64]) => x::atan_f64,
        (Op::Sinh, [K::Float32]) => x::sinh_f32,
        (Op::Sinh, [K::Float64]) => x::sinh_f64,
        (Op::Cosh, [K::Float32]) => x::cosh_f32,
        (Op::Cosh, [K::Float64]) => x::cosh_f64,
        (Op::Tanh, [K::Float32]) => x::tanh_f32,
        (Op::Tanh, [K::Float64]) => x::tanh_f64,

        _ => return Err(unsupported(op, kinds)),
    };
    Ok(executor)
}

/// Shapes accepted by `op`, in catalog order
pub fn accepted_shapes(op: Operation) -> Vec<Vec<ValueKind>> {
    use ValueKind as K;

    const UNARY_CANDIDATES: [K; 9] = [
        K::Int32,
        K::Int64,
        K::Float32,
        K::Float64,
        K::Extended80,
        K::VectorF32,
        K::VectorF64,
        K::VectorBool,
        K::Pointer,
    ];

    if op.arity() == 1 {
        UNARY_CANDIDATES
            .iter()
            .filter(|k| resolve(op, &[**k]).is_ok())
            .map(|k| vec![*k])
            .collect()
    } else {
        UNARY_CANDIDATES
            .iter()
            .flat_map(|a| UNARY_CANDIDATES.iter().map(move |b| vec![*a, *b]))
            .filter(|shape| resolve(op, shape).is_ok())
            .collect()
    }
}

/// Generic, uncached evaluation of `op`
///
/// Resolves for the observed shape on every call, then runs the result.
pub fn execute_generic(
    op: Operation,
    args: &[NumericValue],
    memory: &mut dyn Memory,
) -> RuntimeResult<NumericValue> {
    let kinds: Vec<ValueKind> = args.iter().map(NumericValue::kind).collect();
    let executor = resolve(op, &kinds)?;
    executor(args, memory)
}
