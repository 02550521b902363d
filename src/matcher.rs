/// Pattern matching: URL → category name
use crate::rules::CategoryRule;

/// Name of the category a tab lands in when no rule matches
pub const FALLBACK_CATEGORY: &str = "Others";

/// Find the category for a URL.
///
/// Rules are scanned in list order and the first rule with any matching
/// pattern wins. Returns `fallback` when nothing matches.
pub fn categorize<'a>(rules: &'a [CategoryRule], url: &str, fallback: &'a str) -> &'a str {
    rules
        .iter()
        .find(|rule| rule.matches(url))
        .map(|rule| rule.name.as_str())
        .unwrap_or(fallback)
}
