//! Calculator endpoints over the [`arith`](crate::arith) helpers.

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ApiError;
use crate::arith::{self, DivideResult, MultiplyResult};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Operands {
    pub a: f64,
    pub b: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FactorialQuery {
    pub n: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorialResponse {
    pub n: i64,
    pub result: i64,
}

fn parse<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(q)| q).map_err(|e| {
        debug!(error = %e, "Rejected query string");
        ApiError::bad_request("Bad Request", e.body_text())
    })
}

pub async fn multiply(
    query: Result<Query<Operands>, QueryRejection>,
) -> Result<Json<MultiplyResult>, ApiError> {
    let Operands { a, b } = parse(query)?;
    Ok(Json(arith::basic_multiply(a, b)))
}

pub async fn divide(
    query: Result<Query<Operands>, QueryRejection>,
) -> Result<Json<DivideResult>, ApiError> {
    let Operands { a, b } = parse(query)?;
    Ok(Json(arith::basic_divide(a, b)?))
}

pub async fn factorial(
    query: Result<Query<FactorialQuery>, QueryRejection>,
) -> Result<Json<FactorialResponse>, ApiError> {
    let FactorialQuery { n } = parse(query)?;
    let result = arith::factorial(n)?;
    Ok(Json(FactorialResponse { n, result }))
}
