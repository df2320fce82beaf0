//! Client identifier resolution for admission control

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the client address in order: first hop of `X-Forwarded-For`,
/// `X-Real-IP`, the direct peer, then `"unknown"`.
///
/// With `trust_forwarded` off the proxy headers are ignored entirely.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trust_forwarded: bool,
) -> String {
    if trust_forwarded {
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(first_forwarded_hop)
        {
            return ip;
        }

        if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
            let trimmed = real_ip.trim();
            if is_valid_ip(trimmed) {
                return trimmed.to_string();
            }
        }
    }

    if let Some(addr) = socket_addr {
        return addr.ip().to_string();
    }

    UNKNOWN_CLIENT.to_string()
}

/// Client identifier for a request, using the peer address from `ConnectInfo` when served with it.
pub fn client_identifier(request: &Request, trust_forwarded: bool) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    extract_client_ip(request.headers(), peer.as_ref(), trust_forwarded)
}

fn first_forwarded_hop(header_value: &str) -> Option<String> {
    let first = header_value.split(',').next()?.trim();
    is_valid_ip(first).then(|| first.to_string())
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}
