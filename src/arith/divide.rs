use serde::{Deserialize, Serialize};

use super::{overflowed, ArithmeticError};

/// A single quotient with an overflow marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DivideResult {
    pub result: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub overflow: bool,
}

/// Element-wise quotients.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DivideArrayResult {
    pub results: Vec<f64>,
}

pub fn basic_divide(a: f64, b: f64) -> Result<DivideResult, ArithmeticError> {
    if b == 0.0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    let result = a / b;
    Ok(DivideResult {
        result,
        overflow: overflowed(result),
    })
}

/// Truncating integer division; returns `(quotient, remainder)`.
pub fn divide_integers(a: i64, b: i64) -> Result<(i64, i64), ArithmeticError> {
    if b == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    // i64::MIN / -1 is the only quotient that does not fit
    let quotient = a.checked_div(b).ok_or(ArithmeticError::IntegerOverflow)?;
    Ok((quotient, a.wrapping_rem(b)))
}

pub fn divide_array(numbers: &[f64], divisor: f64) -> Result<DivideArrayResult, ArithmeticError> {
    if divisor == 0.0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    Ok(DivideArrayResult {
        results: numbers.iter().map(|n| n / divisor).collect(),
    })
}

pub fn divide_pairwise(a: &[f64], b: &[f64]) -> Result<DivideArrayResult, ArithmeticError> {
    if a.len() != b.len() {
        return Err(ArithmeticError::LengthMismatch);
    }

    let results = a
        .iter()
        .zip(b)
        .enumerate()
        .map(|(i, (x, y))| {
            if *y == 0.0 {
                Err(ArithmeticError::DivisionByZeroAt(i))
            } else {
                Ok(x / y)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DivideArrayResult { results })
}

/// Divide, falling back to `default` when `b` is zero.
pub fn safe_divide(a: f64, b: f64, default: f64) -> f64 {
    if b == 0.0 {
        default
    } else {
        a / b
    }
}

/// Remainder with the sign of the dividend.
pub fn modulo(a: f64, b: f64) -> Result<f64, ArithmeticError> {
    if b == 0.0 {
        return Err(ArithmeticError::ModuloByZero);
    }
    Ok(a % b)
}

pub fn reciprocal(x: f64) -> Result<f64, ArithmeticError> {
    if x == 0.0 {
        return Err(ArithmeticError::ReciprocalOfZero);
    }
    let result = 1.0 / x;
    if result.is_infinite() {
        return Err(ArithmeticError::ReciprocalOverflow);
    }
    Ok(result)
}
