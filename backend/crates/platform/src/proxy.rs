//! Reverse-proxy detection utilities
//!
//! Computes the effective scheme, host, and client address for requests
//! that may arrive through a reverse proxy or load balancer. Forwarded
//! headers are attacker-controlled unless the proxy strips them, so all
//! helpers take a [`ProxyTrust`] policy deciding whether to honor them.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Policy for trusting `X-Forwarded-*` headers.
#[derive(Debug, Clone, Default)]
pub struct ProxyTrust {
    /// Peer addresses whose forwarded headers are honored.
    /// `None` trusts every peer (deployment behind a managed LB).
    trusted_peers: Option<Vec<IpAddr>>,
}

impl ProxyTrust {
    /// Honor forwarded headers from any peer.
    pub fn trust_all() -> Self {
        Self {
            trusted_peers: None,
        }
    }

    /// Honor forwarded headers only from the listed peers.
    pub fn allow_list(peers: Vec<IpAddr>) -> Self {
        Self {
            trusted_peers: Some(peers),
        }
    }

    /// Whether forwarded headers from `peer` should be honored.
    pub fn honors(&self, peer: Option<IpAddr>) -> bool {
        match &self.trusted_peers {
            None => true,
            Some(list) => peer.is_some_and(|ip| list.contains(&ip)),
        }
    }
}

/// Detect whether the request was made over TLS.
///
/// `direct_tls` is the transport-level flag from the local listener;
/// behind a TLS-terminating proxy it is false and `X-Forwarded-Proto`
/// carries the original scheme.
pub fn is_tls(headers: &HeaderMap, direct_tls: bool, peer: Option<IpAddr>, trust: &ProxyTrust) -> bool {
    if direct_tls {
        return true;
    }

    if !trust.honors(peer) {
        return false;
    }

    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Effective host (and optional port) for redirect URL construction.
///
/// Prefers `X-Forwarded-Host` from a trusted peer, then the `Host`
/// header.
pub fn effective_host(headers: &HeaderMap, peer: Option<IpAddr>, trust: &ProxyTrust) -> Option<String> {
    if trust.honors(peer) {
        if let Some(host) = headers
            .get("x-forwarded-host")
            .and_then(|v| v.to_str().ok())
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
        {
            // Proxies may append a chain; only the first entry is the
            // client-facing host.
            return host.split(',').next().map(|h| h.trim().to_string());
        }
    }

    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|h| h.to_string())
}

/// Extract the client IP address.
///
/// Checks `X-Forwarded-For` (first entry) when the peer is trusted,
/// falling back to the direct connection address.
pub fn client_ip(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    trust: &ProxyTrust,
) -> Option<IpAddr> {
    if trust.honors(direct_ip) {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            if let Some(first) = xff.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }
    direct_ip
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_direct_tls_wins() {
        let headers = HeaderMap::new();
        assert!(is_tls(&headers, true, None, &ProxyTrust::trust_all()));
    }

    #[test]
    fn test_forwarded_proto_https() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert!(is_tls(&headers, false, None, &ProxyTrust::trust_all()));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("HTTPS"));
        assert!(is_tls(&headers, false, None, &ProxyTrust::trust_all()));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        assert!(!is_tls(&headers, false, None, &ProxyTrust::trust_all()));
    }

    #[test]
    fn test_forwarded_proto_untrusted_peer_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));

        let trust = ProxyTrust::allow_list(vec!["10.0.0.1".parse().unwrap()]);
        assert!(!is_tls(&headers, false, peer("192.168.1.50"), &trust));
        assert!(is_tls(&headers, false, peer("10.0.0.1"), &trust));
    }

    #[test]
    fn test_effective_host_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:8080"));
        headers.insert(
            "x-forwarded-host",
            HeaderValue::from_static("shop.example.com"),
        );

        assert_eq!(
            effective_host(&headers, None, &ProxyTrust::trust_all()),
            Some("shop.example.com".to_string())
        );
    }

    #[test]
    fn test_effective_host_falls_back_to_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:8080"));
        headers.insert(
            "x-forwarded-host",
            HeaderValue::from_static("shop.example.com"),
        );

        let trust = ProxyTrust::allow_list(vec![]);
        assert_eq!(
            effective_host(&headers, peer("1.2.3.4"), &trust),
            Some("internal:8080".to_string())
        );
    }

    #[test]
    fn test_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = client_ip(&headers, None, &ProxyTrust::trust_all());
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = client_ip(&headers, Some(direct), &ProxyTrust::trust_all());
        assert_eq!(ip, Some(direct));
    }
}
