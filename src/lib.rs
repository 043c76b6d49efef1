//! Tollgate - HTTP service with per-client rate limiting
//!
//! This crate serves a handful of small HTTP endpoints behind an in-memory,
//! per-client fixed-window rate limiter. The limiter is an explicitly owned
//! object shared with the request layer, and expired client state is evicted
//! by a background sweeper whose lifetime is tied to the server.

pub mod arith;
pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
