use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use super::registrable::strip_port;

const HTTPS_PREFIX: &str = "https://";
const HTTP_PREFIX: &str = "http://";

/// Selects every entry of the domain list when passed as `-d`.
pub const ALL_DOMAINS: &str = "*";

/// Which URL scheme prefixes are removed from domain list entries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchemePolicy {
    /// Strip a leading `https://` or `http://`.
    #[default]
    HttpAndHttps,
    /// Strip a leading `https://` only; `http://` entries are left as written.
    HttpsOnly,
}

/// Normalizes one domain list entry into a bare, lower-cased hostname.
///
/// Exactly one leading scheme prefix is removed, compared literally. After
/// that, any path component, `:port` suffix and trailing root dot are
/// dropped. Entries that still carry a scheme (an `http://` entry under
/// [`SchemePolicy::HttpsOnly`]) are returned trimmed but otherwise untouched.
pub fn normalize_domain(line: &str, policy: SchemePolicy) -> String {
    let trimmed = line.trim();

    let rest = match trimmed.strip_prefix(HTTPS_PREFIX) {
        Some(rest) => rest,
        None => match (policy, trimmed.strip_prefix(HTTP_PREFIX)) {
            (SchemePolicy::HttpAndHttps, Some(rest)) => rest,
            _ => trimmed,
        },
    };

    if rest.contains("://") {
        return rest.to_string();
    }

    let authority = rest.split('/').next().unwrap_or_default();
    strip_port(authority)
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

/// Reads a newline-delimited domain list, skipping blank and `#` comment lines.
pub fn read_domain_list(path: &Path, policy: SchemePolicy) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read domain list: {}", path.display()))?;

    Ok(parse_domain_list(&content, policy))
}

fn parse_domain_list(content: &str, policy: SchemePolicy) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| normalize_domain(line, policy))
        .filter(|domain| !domain.is_empty())
        .collect()
}

/// Resolves the `-d` argument: a single domain, or every list entry when the
/// argument is omitted or `*`.
pub fn select_domains(
    domain_arg: Option<&str>,
    list_path: &Path,
    policy: SchemePolicy,
) -> Result<Vec<String>> {
    match domain_arg.map(str::trim) {
        Some(arg) if arg != ALL_DOMAINS => {
            let domain = normalize_domain(arg, policy);
            if domain.is_empty() {
                return Err(anyhow!("Empty domain given: {:?}", arg));
            }
            Ok(vec![domain])
        }
        _ => read_domain_list(list_path, policy),
    }
}
