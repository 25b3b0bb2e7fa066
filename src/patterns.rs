// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! IP and URL match patterns.
//!
//! Pattern lists are stored as `\n`-joined text. An absent list places no
//! restriction on a request.
//!
//! ## IP patterns
//!
//! | Form | Example |
//! |------|---------|
//! | exact address | `192.168.0.10`, `::1` |
//! | IPv4 with octet wildcards | `192.168.*.*` |
//! | CIDR block | `10.0.0.0/8`, `fe80::/10` |
//!
//! ## URL patterns
//!
//! Path prefixes starting with `/`, e.g. `/rest/api/2/`.

use std::net::IpAddr;

/// A malformed pattern line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

impl PatternError {
    fn new(pattern: &str, reason: impl Into<String>) -> Self {
        Self {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single IP match pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpPattern {
    Exact(IpAddr),
    /// IPv4 octets; `None` matches any value.
    Wildcard([Option<u8>; 4]),
    Cidr { network: IpAddr, prefix: u8 },
}

impl IpPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(PatternError::new(pattern, "empty pattern"));
        }

        if let Some((address, prefix)) = pattern.split_once('/') {
            let network: IpAddr = address
                .parse()
                .map_err(|_| PatternError::new(pattern, "invalid network address"))?;
            let prefix: u8 = prefix
                .parse()
                .map_err(|_| PatternError::new(pattern, "invalid prefix length"))?;
            let max = if network.is_ipv4() { 32 } else { 128 };
            if prefix > max {
                return Err(PatternError::new(pattern, format!("prefix length exceeds {max}")));
            }
            return Ok(IpPattern::Cidr { network, prefix });
        }

        if pattern.contains('*') {
            let parts: Vec<&str> = pattern.split('.').collect();
            if parts.len() != 4 {
                return Err(PatternError::new(pattern, "wildcards need four IPv4 octets"));
            }
            let mut octets = [None; 4];
            for (slot, part) in octets.iter_mut().zip(parts) {
                *slot = match part {
                    "*" => None,
                    value => Some(
                        value
                            .parse::<u8>()
                            .map_err(|_| PatternError::new(pattern, "invalid octet"))?,
                    ),
                };
            }
            return Ok(IpPattern::Wildcard(octets));
        }

        pattern
            .parse::<IpAddr>()
            .map(IpPattern::Exact)
            .map_err(|_| PatternError::new(pattern, "not an IP address"))
    }

    pub fn matches(&self, address: IpAddr) -> bool {
        let address = canonical(address);
        match self {
            IpPattern::Exact(expected) => canonical(*expected) == address,
            IpPattern::Wildcard(octets) => match address {
                IpAddr::V4(v4) => octets
                    .iter()
                    .zip(v4.octets())
                    .all(|(pattern, actual)| pattern.is_none_or(|p| p == actual)),
                IpAddr::V6(_) => false,
            },
            IpPattern::Cidr { network, prefix } => match (canonical(*network), address) {
                (IpAddr::V4(net), IpAddr::V4(addr)) => {
                    prefix_matches(&net.octets(), &addr.octets(), *prefix)
                }
                (IpAddr::V6(net), IpAddr::V6(addr)) => {
                    prefix_matches(&net.octets(), &addr.octets(), *prefix)
                }
                _ => false,
            },
        }
    }
}

/// Treat IPv4-mapped IPv6 addresses as IPv4.
fn canonical(address: IpAddr) -> IpAddr {
    match address {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

fn prefix_matches(network: &[u8], address: &[u8], prefix: u8) -> bool {
    let full = usize::from(prefix / 8);
    let rest = prefix % 8;
    if network[..full] != address[..full] {
        return false;
    }
    if rest == 0 {
        return true;
    }
    let mask = 0xFFu8 << (8 - rest);
    (network[full] & mask) == (address[full] & mask)
}

/// Ordered list of IP patterns; empty means "match any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpMatcher {
    patterns: Vec<IpPattern>,
}

impl IpMatcher {
    /// Parse a `\n`-joined pattern list. Blank lines are skipped.
    pub fn parse(list: Option<&str>) -> Result<Self, PatternError> {
        let patterns = pattern_lines(list)
            .map(IpPattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_unrestricted(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, address: IpAddr) -> bool {
        self.is_unrestricted() || self.patterns.iter().any(|p| p.matches(address))
    }
}

/// Ordered list of URL path prefixes; empty means "match any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMatcher {
    prefixes: Vec<String>,
}

impl UrlMatcher {
    pub fn parse(list: Option<&str>) -> Result<Self, PatternError> {
        let prefixes = pattern_lines(list)
            .map(|line| {
                if line.starts_with('/') {
                    Ok(line.to_string())
                } else {
                    Err(PatternError::new(line, "URL patterns must start with '/'"))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { prefixes })
    }

    pub fn is_unrestricted(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.is_unrestricted() || self.prefixes.iter().any(|prefix| path.starts_with(prefix))
    }
}

fn pattern_lines(list: Option<&str>) -> impl Iterator<Item = &str> {
    list.into_iter()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Parse the address an incoming request came from.
pub fn parse_client_address(value: &str) -> Option<IpAddr> {
    value.trim().parse::<IpAddr>().ok().or_else(|| {
        // "1.2.3.4:5678" style socket addresses
        value
            .trim()
            .parse::<std::net::SocketAddr>()
            .ok()
            .map(|socket| socket.ip())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(value: &str) -> IpAddr {
        value.parse().unwrap()
    }

    #[test]
    fn exact_pattern_matches_single_address() {
        let pattern = IpPattern::parse("192.168.0.10").unwrap();
        assert!(pattern.matches(ip("192.168.0.10")));
        assert!(!pattern.matches(ip("192.168.0.11")));
    }

    #[test]
    fn wildcard_pattern_matches_octets() {
        let pattern = IpPattern::parse("192.168.*.*").unwrap();
        assert!(pattern.matches(ip("192.168.4.200")));
        assert!(!pattern.matches(ip("192.169.4.200")));
        assert!(!pattern.matches(ip("::1")));
    }

    #[test]
    fn cidr_pattern_matches_prefix() {
        let pattern = IpPattern::parse("10.0.0.0/8").unwrap();
        assert!(pattern.matches(ip("10.200.1.1")));
        assert!(!pattern.matches(ip("11.0.0.1")));

        let pattern = IpPattern::parse("172.16.0.0/12").unwrap();
        assert!(pattern.matches(ip("172.31.255.255")));
        assert!(!pattern.matches(ip("172.32.0.0")));

        let pattern = IpPattern::parse("fe80::/10").unwrap();
        assert!(pattern.matches(ip("fe80::1")));
        assert!(!pattern.matches(ip("2001:db8::1")));
    }

    #[test]
    fn mapped_ipv6_matches_ipv4_pattern() {
        let pattern = IpPattern::parse("127.0.0.1").unwrap();
        assert!(pattern.matches(ip("::ffff:127.0.0.1")));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        for bad in ["192.168.*", "300.1.1.1", "abc", "10.0.0.0/33", "10.0.0.0/x", "*.*.*.x"] {
            assert!(IpPattern::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn matcher_without_patterns_matches_everything() {
        let matcher = IpMatcher::parse(None).unwrap();
        assert!(matcher.is_unrestricted());
        assert!(matcher.matches(ip("8.8.8.8")));
    }

    #[test]
    fn matcher_checks_each_line() {
        let matcher = IpMatcher::parse(Some("10.0.0.1\n192.168.*.*\n\n")).unwrap();
        assert!(matcher.matches(ip("10.0.0.1")));
        assert!(matcher.matches(ip("192.168.1.1")));
        assert!(!matcher.matches(ip("10.0.0.2")));
    }

    #[test]
    fn matcher_reports_bad_line() {
        let err = IpMatcher::parse(Some("10.0.0.1\nnonsense")).unwrap_err();
        assert_eq!(err.pattern, "nonsense");
    }

    #[test]
    fn url_matcher_uses_prefixes() {
        let matcher = UrlMatcher::parse(Some("/rest/api\n/plugins/servlet")).unwrap();
        assert!(matcher.matches("/rest/api/2/issue"));
        assert!(matcher.matches("/plugins/servlet/gadgets"));
        assert!(!matcher.matches("/secure/Dashboard.jspa"));

        assert!(UrlMatcher::parse(None).unwrap().matches("/anything"));
        assert!(UrlMatcher::parse(Some("rest/api")).is_err());
    }

    #[test]
    fn client_address_parsing() {
        assert_eq!(parse_client_address("10.1.1.1"), Some(ip("10.1.1.1")));
        assert_eq!(parse_client_address("10.1.1.1:8080"), Some(ip("10.1.1.1")));
        assert_eq!(parse_client_address("not-an-ip"), None);
    }
}
