/// Validation of rules authored on the settings page
use std::collections::HashSet;

use url::{Host, Url};

use crate::error::{self, GrouperError};
use crate::pattern::Pattern;
use crate::rules::{GroupColor, RuleRecord};

/// Preset group names offered by the settings form; `other` means custom
pub const PRESET_NAMES: [&str; 14] = [
    "search",
    "social",
    "news",
    "shopping",
    "entertainment",
    "work",
    "education",
    "health",
    "finance",
    "sports",
    "travel",
    "food",
    "development",
    "other",
];

pub const CUSTOM_NAME: &str = "other";

/// One rule as typed into the settings form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleDraft {
    pub preset_name: String,
    pub custom_name: String,
    pub color: String,
    pub urls: Vec<String>,
}

impl RuleDraft {
    pub fn new() -> RuleDraft {
        RuleDraft {
            urls: vec![String::new()],
            ..RuleDraft::default()
        }
    }

    pub fn name(&self) -> &str {
        if self.preset_name == CUSTOM_NAME {
            self.custom_name.trim()
        } else {
            self.preset_name.trim()
        }
    }

    pub fn apply(&mut self, edit: DraftEdit) {
        match edit {
            DraftEdit::Preset(name) => self.preset_name = name,
            DraftEdit::Custom(name) => self.custom_name = name,
            DraftEdit::Color(color) => self.color = color,
            DraftEdit::Url(index, url) => {
                if let Some(slot) = self.urls.get_mut(index) {
                    *slot = url;
                }
            }
            DraftEdit::AddUrl => self.urls.push(String::new()),
            // The last URL row stays so the form is never empty
            DraftEdit::RemoveUrl(index) => {
                if self.urls.len() > 1 && index < self.urls.len() {
                    self.urls.remove(index);
                }
            }
        }
    }
}

/// One change typed into a form
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Preset(String),
    Custom(String),
    Color(String),
    Url(usize, String),
    AddUrl,
    RemoveUrl(usize),
}

/// Add newly validated rules to the saved ones; a new rule replaces a saved
/// rule of the same name
pub fn merge_records(saved: &[RuleRecord], added: Vec<RuleRecord>) -> Vec<RuleRecord> {
    let mut merged: Vec<RuleRecord> = saved
        .iter()
        .filter(|s| !added.iter().any(|a| a.name == s.name))
        .cloned()
        .collect();
    merged.extend(added);
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Color,
    Url(usize),
}

/// A problem with one field of one form
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub form: usize,
    pub field: DraftField,
    pub message: String,
}

impl FieldError {
    fn new(form: usize, field: DraftField, message: &str) -> FieldError {
        FieldError {
            form,
            field,
            message: message.to_string(),
        }
    }
}

/// Turn every form into a rule, or report every invalid field
pub fn validate_drafts(drafts: &[RuleDraft]) -> Result<Vec<RuleRecord>, Vec<FieldError>> {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut seen_names = HashSet::new();

    for (form, draft) in drafts.iter().enumerate() {
        let name = draft.name();
        if name.is_empty() {
            errors.push(FieldError::new(form, DraftField::Name, "Please select or enter a group name."));
        } else if !seen_names.insert(name.to_string()) {
            errors.push(FieldError::new(form, DraftField::Name, "Group names must be unique."));
        }

        let color = GroupColor::parse(&draft.color);
        if color.is_none() {
            errors.push(FieldError::new(form, DraftField::Color, "Please select a color."));
        }

        let mut patterns = Vec::new();
        for (index, input) in draft.urls.iter().enumerate() {
            match simplify_url(input) {
                Some(source) => patterns.push(source),
                None => errors.push(FieldError::new(form, DraftField::Url(index), "Please enter a valid URL.")),
            }
        }
        if draft.urls.is_empty() {
            errors.push(FieldError::new(form, DraftField::Url(0), "Please enter a valid URL."));
        }

        if let Some(color) = color {
            patterns.sort();
            patterns.dedup();
            records.push(RuleRecord {
                name: name.to_string(),
                color,
                patterns,
            });
        }
    }

    if errors.is_empty() { Ok(records) } else { Err(errors) }
}

/// Check rules arriving over the command surface before they replace the
/// stored ones: every rule needs a name and every pattern must compile
pub fn check_records(records: &[RuleRecord]) -> error::Result<()> {
    for record in records {
        if record.name.trim().is_empty() {
            return Err(GrouperError::Validation("group name is empty".to_string()));
        }
        for source in &record.patterns {
            Pattern::new(source)
                .map_err(|e| GrouperError::Validation(format!("{:?} in {:?}: {}", source, record.name, e)))?;
        }
    }
    Ok(())
}

/// Reduce a typed URL to the source of its hostname pattern.
///
/// The scheme is optional; the host must be a dotted domain name or an
/// IPv4 address.
pub fn simplify_url(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() || input.contains(char::is_whitespace) {
        return None;
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = match url.host()? {
        Host::Domain(domain) if is_domain_name(domain) => domain.strip_prefix("www.").unwrap_or(domain).to_string(),
        Host::Ipv4(ip) => ip.to_string(),
        _ => return None,
    };

    Pattern::hostname(&host).ok().map(|p| p.source().to_string())
}

fn is_domain_name(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };

    labels.len() >= 2
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, color: &str, urls: &[&str]) -> RuleDraft {
        RuleDraft {
            preset_name: name.to_string(),
            custom_name: String::new(),
            color: color.to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_simplify_url() {
        assert_eq!(simplify_url("https://www.github.com/rust-lang"), Some(r"github\.com".to_string()));
        assert_eq!(simplify_url("indeed.com/jobs?q=rust"), Some(r"indeed\.com".to_string()));
        assert_eq!(simplify_url("http://192.168.1.1:8080/admin"), Some(r"192\.168\.1\.1".to_string()));
        assert_eq!(simplify_url("localhost"), None);
        assert_eq!(simplify_url("not a url"), None);
        assert_eq!(simplify_url("ftp://example.com"), None);
        assert_eq!(simplify_url(""), None);
    }

    #[test]
    fn test_valid_drafts() {
        let mut custom = draft(CUSTOM_NAME, "cyan", &["https://news.ycombinator.com"]);
        custom.custom_name = "  HN ".to_string();

        let records = validate_drafts(&[
            draft("development", "green", &["stackoverflow.com", "https://stackoverflow.com/q/1"]),
            custom,
        ])
        .unwrap();

        assert_eq!(records[0].name, "development");
        assert_eq!(records[0].patterns, vec![r"stackoverflow\.com".to_string()]);
        assert_eq!(records[1].name, "HN");
        assert_eq!(records[1].color, GroupColor::Cyan);
    }

    #[test]
    fn test_errors_are_reported_per_field() {
        let errors = validate_drafts(&[
            draft("", "Select a color", &["github.com", "bad url"]),
            draft("work", "blue", &[]),
        ])
        .unwrap_err();

        let fields: Vec<(usize, DraftField)> = errors.iter().map(|e| (e.form, e.field)).collect();
        assert_eq!(
            fields,
            vec![
                (0, DraftField::Name),
                (0, DraftField::Color),
                (0, DraftField::Url(1)),
                (1, DraftField::Url(0)),
            ]
        );
    }

    #[test]
    fn test_apply_edits() {
        let mut d = RuleDraft::new();
        d.apply(DraftEdit::Preset(CUSTOM_NAME.to_string()));
        d.apply(DraftEdit::Custom("Reading".to_string()));
        d.apply(DraftEdit::Url(0, "medium.com".to_string()));
        d.apply(DraftEdit::AddUrl);
        d.apply(DraftEdit::Url(1, "substack.com".to_string()));
        d.apply(DraftEdit::RemoveUrl(0));
        d.apply(DraftEdit::RemoveUrl(0));

        assert_eq!(d.name(), "Reading");
        assert_eq!(d.urls, vec!["substack.com".to_string()]);
    }

    #[test]
    fn test_merge_records_replaces_same_name() {
        let saved = vec![
            RuleRecord {
                name: "work".to_string(),
                color: GroupColor::Blue,
                patterns: vec![r"jira\.com".to_string()],
            },
            RuleRecord {
                name: "news".to_string(),
                color: GroupColor::Red,
                patterns: vec![r"bbc\.co\.uk".to_string()],
            },
        ];
        let added = vec![RuleRecord {
            name: "work".to_string(),
            color: GroupColor::Green,
            patterns: vec![r"github\.com".to_string()],
        }];

        let merged = merge_records(&saved, added);
        let names: Vec<&str> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["news", "work"]);
        assert_eq!(merged[1].color, GroupColor::Green);
    }

    #[test]
    fn test_check_records() {
        let good = RuleRecord {
            name: "job".to_string(),
            color: GroupColor::Purple,
            patterns: vec![r"/indeed\.com/".to_string()],
        };
        assert!(check_records(&[good.clone()]).is_ok());

        let unnamed = RuleRecord {
            name: " ".to_string(),
            ..good.clone()
        };
        assert!(matches!(check_records(&[unnamed]), Err(GrouperError::Validation(_))));

        let broken = RuleRecord {
            patterns: vec!["(unclosed".to_string()],
            ..good
        };
        assert!(matches!(check_records(&[broken]), Err(GrouperError::Validation(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let errors = validate_drafts(&[
            draft("work", "blue", &["github.com"]),
            draft("work", "red", &["gitlab.com"]),
        ])
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].form, 1);
        assert_eq!(errors[0].message, "Group names must be unique.");
    }
}
