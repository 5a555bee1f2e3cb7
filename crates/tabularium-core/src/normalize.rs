//! # Text and Host Normalization
//!
//! Building blocks used by entity hooks before any identity attribute is
//! placed into a key:
//!
//! - Unicode NFC normalization of user-supplied text
//! - case folding
//! - hostname conversion to ASCII (punycode) form
//! - classification of IP literals and private address ranges
//!
//! Every function here is a fixed point on its own output, which is what
//! lets the hook pipeline be re-run on normalized data without effect.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use unicode_normalization::UnicodeNormalization;

use crate::error::NormalizeError;

/// NFC-normalize and trim surrounding whitespace.
pub fn nfc(s: &str) -> String {
    s.trim().nfc().collect()
}

/// NFC-normalize, trim, and lowercase.
pub fn fold_case(s: &str) -> String {
    nfc(s).to_lowercase()
}

/// Convert a hostname to its canonical ASCII form.
///
/// IP literals and CIDR ranges pass through (lowercased, so IPv6 hex digits
/// are stable). Pure-ASCII names are lowercased and stripped of trailing
/// root dots. Names containing non-ASCII characters are converted to
/// punycode via IDNA; a name IDNA rejects is an error.
pub fn ascii_host(s: &str) -> Result<String, NormalizeError> {
    let folded = fold_case(s);
    let trimmed = folded.trim_end_matches('.');
    if trimmed.is_empty() || trimmed.is_ascii() || parse_ip(trimmed).is_some() {
        return Ok(trimmed.to_string());
    }
    idna::domain_to_ascii(trimmed).map_err(|_| NormalizeError::InvalidHostname(s.to_string()))
}

/// Parse an IP literal, tolerating IPv6 brackets.
pub fn parse_ip(s: &str) -> Option<IpAddr> {
    let s = s.trim_start_matches('[').trim_end_matches(']');
    s.parse().ok()
}

/// Whether `s` looks like a CIDR range (`<ip>/<prefix>`).
pub fn is_cidr(s: &str) -> bool {
    match s.split_once('/') {
        Some((ip, prefix)) => {
            let Some(ip) = parse_ip(ip) else {
                return false;
            };
            let max = if ip.is_ipv4() { 32 } else { 128 };
            prefix.parse::<u8>().map(|p| p <= max).unwrap_or(false)
        }
        None => false,
    }
}

/// Whether an address belongs to a non-routable range.
///
/// Covers RFC1918, loopback, link-local, CGNAT (100.64/10), and IPv6
/// unique-local (fc00::/7). IPv4-mapped IPv6 addresses are classified by
/// their embedded IPv4 address.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => is_private_v6(v6),
        },
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_private() || ip.is_loopback() || ip.is_link_local() || (a == 100 && (64..128).contains(&b))
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

/// Whether a host string (IP literal or CIDR) sits in a private range.
/// Hostnames are never private by this test.
pub fn is_private_host(s: &str) -> bool {
    let ip_part = s.split_once('/').map_or(s, |(ip, _)| ip);
    parse_ip(ip_part).is_some_and(is_private_ip)
}
