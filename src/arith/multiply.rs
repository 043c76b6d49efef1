use serde::{Deserialize, Serialize};

use super::{overflowed, ArithmeticError};

/// Largest `n` whose factorial fits in an `i64`.
pub const MAX_FACTORIAL_INPUT: i64 = 20;

/// A single product with an overflow marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplyResult {
    pub result: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub overflow: bool,
}

/// Element-wise products.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiplyArrayResult {
    pub results: Vec<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub overflow: bool,
}

pub fn basic_multiply(a: f64, b: f64) -> MultiplyResult {
    let result = a * b;
    MultiplyResult {
        result,
        overflow: overflowed(result),
    }
}

/// Multiply two integers, reporting which way the product left `i64`.
pub fn multiply_integers(a: i64, b: i64) -> Result<i64, ArithmeticError> {
    a.checked_mul(b).ok_or(if (a < 0) == (b < 0) {
        ArithmeticError::IntegerOverflow
    } else {
        ArithmeticError::IntegerUnderflow
    })
}

/// Product of every element, stopping at the first overflow.
///
/// An empty slice yields no results rather than the empty product.
pub fn multiply_array(numbers: &[f64]) -> MultiplyArrayResult {
    if numbers.is_empty() {
        return MultiplyArrayResult::default();
    }

    let mut product = 1.0;
    let mut overflow = false;
    for &n in numbers {
        product *= n;
        if overflowed(product) {
            overflow = true;
            break;
        }
    }

    MultiplyArrayResult {
        results: vec![product],
        overflow,
    }
}

pub fn multiply_pairwise(a: &[f64], b: &[f64]) -> Result<MultiplyArrayResult, ArithmeticError> {
    if a.len() != b.len() {
        return Err(ArithmeticError::LengthMismatch);
    }

    let results: Vec<f64> = a.iter().zip(b).map(|(x, y)| x * y).collect();
    let overflow = results.iter().any(|&r| overflowed(r));
    Ok(MultiplyArrayResult { results, overflow })
}

pub fn multiply_by_scalar(numbers: &[f64], scalar: f64) -> MultiplyArrayResult {
    let results: Vec<f64> = numbers.iter().map(|n| n * scalar).collect();
    let overflow = results.iter().any(|&r| overflowed(r));
    MultiplyArrayResult { results, overflow }
}

pub fn power(base: f64, exponent: f64) -> MultiplyResult {
    let result = base.powf(exponent);
    MultiplyResult {
        result,
        overflow: overflowed(result),
    }
}

pub fn factorial(n: i64) -> Result<i64, ArithmeticError> {
    if n < 0 {
        return Err(ArithmeticError::NegativeFactorial);
    }
    if n > MAX_FACTORIAL_INPUT {
        return Err(ArithmeticError::FactorialOverflow);
    }
    Ok((2..=n).product())
}
