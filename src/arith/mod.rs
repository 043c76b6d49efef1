//! Checked arithmetic behind the calculator endpoints.
//!
//! Floating point operations never fail on overflow; they report it through
//! an `overflow` flag instead. Integer operations and anything with an
//! undefined result return an [`ArithmeticError`].

mod divide;
mod multiply;

pub use divide::{
    basic_divide, divide_array, divide_integers, divide_pairwise, modulo, reciprocal,
    safe_divide, DivideArrayResult, DivideResult,
};
pub use multiply::{
    basic_multiply, factorial, multiply_array, multiply_by_scalar, multiply_integers,
    multiply_pairwise, power, MultiplyArrayResult, MultiplyResult, MAX_FACTORIAL_INPUT,
};

use thiserror::Error;

/// Errors produced by the arithmetic helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("division by zero at index {0}")]
    DivisionByZeroAt(usize),
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("reciprocal of zero is undefined")]
    ReciprocalOfZero,
    #[error("reciprocal overflow")]
    ReciprocalOverflow,
    #[error("integer overflow: result too large")]
    IntegerOverflow,
    #[error("integer underflow: result too small")]
    IntegerUnderflow,
    #[error("arrays must have the same length")]
    LengthMismatch,
    #[error("factorial is not defined for negative numbers")]
    NegativeFactorial,
    #[error("factorial overflow: number too large")]
    FactorialOverflow,
}

/// Whether a floating point result has left the representable range.
fn overflowed(value: f64) -> bool {
    value.is_infinite() || value.is_nan()
}
