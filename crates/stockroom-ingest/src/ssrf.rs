//! Outbound URL checks for remote catalog images.
//!
//! Image bytes fetched from a row's URL are re-hosted publicly, so a URL must not
//! reach loopback, link-local, private or otherwise internal hosts. Hostnames are
//! resolved and every address is checked, which also catches names pointing inside.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tokio::net::lookup_host;

const INTERNAL_SUFFIXES: [&str; 4] = [".local", ".localhost", ".internal", ".corp"];

/// Reject URLs whose host is, or resolves to, a non-public address.
///
/// `allow_private_ips` disables the address checks (local test servers); the scheme
/// check always applies.
pub async fn validate_url_for_ssrf(url: &reqwest::Url, allow_private_ips: bool) -> Result<(), String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("scheme '{}' is not allowed", url.scheme()));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| "URL must have a host".to_string())?;

    if allow_private_ips {
        return Ok(());
    }

    // IPv6 literals keep their brackets in `host_str`
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return check_ip(ip);
    }

    let name = host.trim_end_matches('.').to_lowercase();

    if name == "localhost" || INTERNAL_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return Err(format!("internal hostname '{}' is not allowed", name));
    }

    let port = url.port_or_known_default().unwrap_or(80);
    match lookup_host((name.as_str(), port)).await {
        Ok(addrs) => {
            for addr in addrs {
                check_ip(addr.ip()).map_err(|e| format!("'{}' resolves to {}", name, e))?;
            }
        }
        // The fetch itself fails on an unresolvable host
        Err(e) => {
            tracing::warn!(host = %name, error = %e, "Failed to resolve image host for URL check");
        }
    }

    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<(), String> {
    if is_private_ip(&ip) {
        Err(format!("private or internal address {} is not allowed", ip))
    } else {
        Ok(())
    }
}

/// Loopback, private, link-local, CGNAT, multicast, broadcast and unspecified ranges.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_ipv4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_ipv4(&v4),
            None => is_private_ipv6(v6),
        },
    }
}

fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_unspecified()
        || a == 0
        || (a == 100 && (64..=127).contains(&b))
}

fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || first & 0xffc0 == 0xfe80 // fe80::/10
        || first & 0xfe00 == 0xfc00 // fc00::/7
}
