/// Category rules: the data model behind tab grouping
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

/// Display color of a tab group, matching the browser's fixed palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum GroupColor {
    #[default]
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl GroupColor {
    pub const ALL: [GroupColor; 9] = [
        GroupColor::Grey,
        GroupColor::Blue,
        GroupColor::Red,
        GroupColor::Yellow,
        GroupColor::Green,
        GroupColor::Pink,
        GroupColor::Purple,
        GroupColor::Cyan,
        GroupColor::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupColor::Grey => "grey",
            GroupColor::Blue => "blue",
            GroupColor::Red => "red",
            GroupColor::Yellow => "yellow",
            GroupColor::Green => "green",
            GroupColor::Pink => "pink",
            GroupColor::Purple => "purple",
            GroupColor::Cyan => "cyan",
            GroupColor::Orange => "orange",
        }
    }

    /// Parse a color name; unknown names are `None`
    pub fn parse(name: &str) -> Option<GroupColor> {
        let name = name.trim().to_ascii_lowercase();
        GroupColor::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

// Unknown or legacy color names fall back to grey instead of failing the load
impl From<String> for GroupColor {
    fn from(name: String) -> Self {
        GroupColor::parse(&name).unwrap_or_default()
    }
}

impl fmt::Display for GroupColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named category with the patterns that put tabs into it
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub name: String,
    pub color: GroupColor,
    pub patterns: BTreeSet<Pattern>,
}

impl CategoryRule {
    pub fn new(name: impl Into<String>, color: GroupColor) -> CategoryRule {
        CategoryRule {
            name: name.into(),
            color,
            patterns: BTreeSet::new(),
        }
    }

    pub fn with_patterns(mut self, patterns: impl IntoIterator<Item = Pattern>) -> CategoryRule {
        self.patterns.extend(patterns);
        self
    }

    pub fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(url))
    }

    /// Drop every pattern matching `url`, returning how many went
    pub fn remove_matching(&mut self, url: &str) -> usize {
        let before = self.patterns.len();
        self.patterns.retain(|p| !p.matches(url));
        before - self.patterns.len()
    }

    pub fn to_record(&self) -> RuleRecord {
        RuleRecord {
            name: self.name.clone(),
            color: self.color,
            patterns: self.patterns.iter().map(|p| p.source().to_string()).collect(),
        }
    }

    /// Build a rule from its stored form, skipping patterns that no longer compile
    pub fn from_record(record: RuleRecord) -> CategoryRule {
        let patterns = record.patterns.iter().filter_map(|source| match Pattern::new(source) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("Skipping pattern {:?} of rule {:?}: {}", source, record.name, e);
                None
            }
        });

        CategoryRule::new(record.name.clone(), record.color).with_patterns(patterns.collect::<Vec<_>>())
    }
}

/// Stored (and wire) form of a rule: `{name, color, patterns: [source, ...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub name: String,
    #[serde(default)]
    pub color: GroupColor,
    #[serde(default, alias = "urls")]
    pub patterns: Vec<String>,
}

/// Built-in categories seeded on first install
pub fn default_rules() -> Vec<RuleRecord> {
    let rule = |name: &str, color: GroupColor, hosts: &[&str]| RuleRecord {
        name: name.to_string(),
        color,
        patterns: hosts.iter().map(|h| regex::escape(h)).collect(),
    };

    vec![
        rule("Search", GroupColor::Blue, &["google.com", "bing.com"]),
        rule("codeRepository", GroupColor::Green, &["github.com", "bitbucket.org"]),
        rule("Development", GroupColor::Green, &["stackoverflow.com", "codepen.io"]),
        rule("Entertainment", GroupColor::Red, &["youtube.com"]),
        rule("Professional", GroupColor::Purple, &["linkedin.com"]),
        rule(
            "Social",
            GroupColor::Grey,
            &["facebook.com", "twitter.com", "instagram.com", "reddit.com", "discord.com"],
        ),
        rule(
            "Movies",
            GroupColor::Orange,
            &["netflix.com", "hulu.com", "amazon.com", "movies7.to"],
        ),
        rule("article", GroupColor::Blue, &["medium.com", "dev.to", "towardsdatascience.com"]),
        rule("job", GroupColor::Purple, &["indeed.com", "glassdoor.com", "apec.fr"]),
    ]
}
