//! Registrable-domain resolution against the public suffix list.
//!
//! Suffix lengths differ per registry (`com` vs `co.th` vs `gov.cn`), so the
//! zone for a host is found with the compiled list shipped by the `addr`
//! crate rather than by counting labels.

use serde::Serialize;
use thiserror::Error;

/// Record name Cloudflare uses for the zone apex.
pub const APEX: &str = "@";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name {host}: {reason}")]
    Invalid { host: String, reason: String },

    #[error("{0} has no registrable domain (it is a public suffix)")]
    NoRegistrableDomain(String),
}

/// Where a domain entry lands in Cloudflare: the zone to use and the A record
/// name inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub host: String,
    pub zone: String,
    pub record_name: String,
}

/// Returns the registrable domain (label + public suffix) of `input`.
///
/// `input` may carry a scheme or a path; both are ignored.
pub fn registrable_domain(input: &str) -> Result<String, DomainError> {
    let host = host_of(input);

    let parsed = addr::parse_domain_name(&host).map_err(|e| DomainError::Invalid {
        host: host.clone(),
        reason: e.to_string(),
    })?;

    parsed
        .root()
        .map(str::to_string)
        .ok_or_else(|| DomainError::NoRegistrableDomain(host.clone()))
}

/// Computes the zone and record name for a domain entry.
pub fn resolve_target(input: &str) -> Result<Target, DomainError> {
    let host = host_of(input);
    let zone = registrable_domain(&host)?;
    let record_name = record_name_for(&host, &zone);

    Ok(Target {
        host,
        zone,
        record_name,
    })
}

/// `@` when `host` is the zone itself, otherwise the leading label of `host`
/// (`user.example.com` in `example.com` is `user`, `a.b.example.com` is `a`).
pub fn record_name_for(host: &str, zone: &str) -> String {
    host.strip_suffix(zone)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .and_then(|prefix| prefix.split('.').next())
        .filter(|label| !label.is_empty())
        .unwrap_or(APEX)
        .to_string()
}

fn host_of(input: &str) -> String {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest);

    let authority = without_scheme.split('/').next().unwrap_or_default();

    strip_port(authority)
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

/// Drops a trailing `:port` from a host.
pub(crate) fn strip_port(authority: &str) -> &str {
    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_label_suffix() {
        assert_eq!(registrable_domain("openai.com").unwrap(), "openai.com");
        assert_eq!(registrable_domain("chat.openai.com").unwrap(), "openai.com");
        assert_eq!(
            registrable_domain("http://chat.openai.com").unwrap(),
            "openai.com"
        );
    }

    #[test]
    fn test_multi_label_suffix() {
        assert_eq!(
            registrable_domain("chat.openai.co.th").unwrap(),
            "openai.co.th"
        );
        assert_eq!(
            registrable_domain("http://chat.openai.gov.cn").unwrap(),
            "openai.gov.cn"
        );
        assert_eq!(
            registrable_domain("a.b.example.co.uk").unwrap(),
            "example.co.uk"
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        for host in [
            "openai.com",
            "chat.openai.com",
            "chat.openai.co.th",
            "deep.sub.example.com.au",
            "https://shop.example.gov.cn/cart",
        ] {
            let once = registrable_domain(host).unwrap();
            let twice = registrable_domain(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", host);
        }
    }

    #[test]
    fn test_public_suffix_has_no_registrable_domain() {
        assert_eq!(
            registrable_domain("co.th"),
            Err(DomainError::NoRegistrableDomain("co.th".to_string()))
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(registrable_domain("").is_err());
        assert!(registrable_domain("com").is_err());
    }

    #[test]
    fn test_apex_target() {
        let target = resolve_target("example.com").unwrap();
        assert_eq!(target.zone, "example.com");
        assert_eq!(target.record_name, APEX);

        let target = resolve_target("example.co.th").unwrap();
        assert_eq!(target.zone, "example.co.th");
        assert_eq!(target.record_name, APEX);
    }

    #[test]
    fn test_subdomain_target() {
        let target = resolve_target("user.example.com").unwrap();
        assert_eq!(target.host, "user.example.com");
        assert_eq!(target.zone, "example.com");
        assert_eq!(target.record_name, "user");

        let target = resolve_target("https://chat.openai.co.th").unwrap();
        assert_eq!(target.zone, "openai.co.th");
        assert_eq!(target.record_name, "chat");
    }

    #[test]
    fn test_nested_subdomain_uses_leading_label() {
        let target = resolve_target("a.b.example.com").unwrap();
        assert_eq!(target.host, "a.b.example.com");
        assert_eq!(target.zone, "example.com");
        assert_eq!(target.record_name, "a");

        let target = resolve_target("shop.eu.example.co.uk").unwrap();
        assert_eq!(target.zone, "example.co.uk");
        assert_eq!(target.record_name, "shop");
    }

    #[test]
    fn test_port_is_ignored() {
        assert_eq!(
            registrable_domain("https://example.com:8443/").unwrap(),
            "example.com"
        );

        let target = resolve_target("https://user.example.com:8443/login").unwrap();
        assert_eq!(target.host, "user.example.com");
        assert_eq!(target.zone, "example.com");
        assert_eq!(target.record_name, "user");
    }

    #[test]
    fn test_record_name_does_not_match_partial_label() {
        assert_eq!(record_name_for("myexample.com", "example.com"), APEX);
    }
}
