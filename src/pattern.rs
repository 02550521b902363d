/// URL patterns: compiled once, stored as plain regex source text
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use regex::{Regex, RegexBuilder};
use url::Url;

use crate::error::Result;

/// A compiled URL-matching pattern.
///
/// Equality, ordering and hashing only look at the source text, so a
/// pattern set never holds the same expression twice.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern from its stored source.
    ///
    /// Accepts the legacy `/source/flags` form written by older versions
    /// of the settings page; only the `i` flag is honoured.
    pub fn new(source: &str) -> Result<Pattern> {
        let (body, case_insensitive) = strip_delimiters(source.trim());
        let regex = RegexBuilder::new(body)
            .case_insensitive(case_insensitive)
            .build()?;

        let source = if case_insensitive {
            format!("(?i){}", body)
        } else {
            body.to_string()
        };

        Ok(Pattern { source, regex })
    }

    /// An escaped-literal pattern matching `host` anywhere in a URL
    pub fn hostname(host: &str) -> Result<Pattern> {
        Pattern::new(&regex::escape(host))
    }

    /// Learn a pattern from an observed URL: its hostname, never the path
    ///
    /// Examples:
    /// - https://www.github.com/foo → `github\.com`
    /// - https://stackoverflow.com/questions/1 → `stackoverflow\.com`
    pub fn from_url(url: &str) -> Result<Pattern> {
        Pattern::hostname(&extract_hostname(url)?)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source.cmp(&other.source)
    }
}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

/// Extract the hostname of a URL, lowercased, without a leading `www.`
pub fn extract_hostname(url: &str) -> Result<String> {
    let parsed = Url::parse(url.trim())?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(url::ParseError::EmptyHost)?;

    Ok(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Check if a string looks like an IPv4 address
pub fn is_ip_address(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 4 && parts.iter().all(|p| !p.is_empty() && p.parse::<u8>().is_ok())
}

fn strip_delimiters(source: &str) -> (&str, bool) {
    if let Some(rest) = source.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let flags = &rest[end + 1..];
            if is_regex_flags(flags) {
                return (&rest[..end], flags.contains('i'));
            }
        }
    }
    (source, false)
}

// Only the JS literal flags, each at most once; `/wiki/Rust` is a plain source
fn is_regex_flags(flags: &str) -> bool {
    flags.chars().enumerate().all(|(i, c)| "gimsuy".contains(c) && !flags[..i].contains(c))
}
