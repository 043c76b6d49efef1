//! Client identification for rate limiting.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Identifier used when nothing about the caller is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Work out which client a request belongs to.
///
/// Prefers the first hop of `X-Forwarded-For`, then `X-Real-IP`, then the
/// peer address of the connection. Header values are trusted as given.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    let real_ip = header_str(headers, "x-real-ip")
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_owned();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
