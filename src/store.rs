/// The rule store: the one piece of shared mutable state
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::host::KeyValueStore;
use crate::matcher::categorize;
use crate::pattern::Pattern;
use crate::rules::{CategoryRule, GroupColor, RuleRecord};

/// Ordered, name-unique list of category rules backed by a key-value store.
///
/// Shared by `Rc` between the reconciler, dispatcher and command handler.
/// The list sits in a `RefCell` that is only ever borrowed between await
/// points, so interleaved handlers can race but never panic.
pub struct RuleStore<S> {
    rules: RefCell<Vec<CategoryRule>>,
    storage: Rc<S>,
    key: String,
    fallback: String,
}

impl<S: KeyValueStore> RuleStore<S> {
    pub fn new(storage: Rc<S>, key: impl Into<String>, fallback: impl Into<String>) -> RuleStore<S> {
        RuleStore {
            rules: RefCell::new(Vec::new()),
            storage,
            key: key.into(),
            fallback: fallback.into(),
        }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Returns `false`, leaving the current rules alone, when nothing is
    /// stored or the payload can't be read.
    pub async fn load(&self) -> bool {
        let value = match self.storage.get(&self.key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                log::info!("No stored rules under {:?}", self.key);
                return false;
            }
            Err(e) => {
                log::error!("Failed to load rules: {}", e);
                return false;
            }
        };

        match serde_json::from_value::<Vec<RuleRecord>>(value) {
            Ok(records) => {
                self.replace_all(records);
                log::info!("Loaded {} rules", self.len());
                true
            }
            Err(e) => {
                log::error!("Stored rules are malformed, keeping current ones: {}", e);
                false
            }
        }
    }

    /// Write the whole list, leaving out rules that have no patterns.
    ///
    /// Empty rules stay in memory so a freshly ensured rule keeps its
    /// color until a pattern is learned for it.
    pub async fn save(&self) -> Result<()> {
        let value = serde_json::to_value(self.records())?;
        self.storage.set(&self.key, value).await
    }

    /// `save`, reporting rather than returning a failure
    pub async fn persist(&self) {
        if let Err(e) = self.save().await {
            log::error!("Failed to save rules, keeping them in memory: {}", e);
        }
    }

    pub fn categorize(&self, url: &str) -> String {
        categorize(&self.rules.borrow(), url, &self.fallback).to_string()
    }

    pub fn find_by_name(&self, name: &str) -> Option<CategoryRule> {
        self.rules.borrow().iter().find(|rule| rule.name == name).cloned()
    }

    /// Color of the named rule, grey when there is none
    pub fn color_of(&self, name: &str) -> GroupColor {
        self.find_by_name(name).map(|rule| rule.color).unwrap_or_default()
    }

    pub fn rules(&self) -> Vec<CategoryRule> {
        self.rules.borrow().clone()
    }

    /// Persistable view of the list: every rule that has patterns
    pub fn records(&self) -> Vec<RuleRecord> {
        self.rules
            .borrow()
            .iter()
            .filter(|rule| !rule.patterns.is_empty())
            .map(CategoryRule::to_record)
            .collect()
    }

    pub fn set_color(&self, name: &str, color: GroupColor) -> bool {
        let mut rules = self.rules.borrow_mut();
        match rules.iter_mut().find(|rule| rule.name == name && rule.color != color) {
            Some(rule) => {
                rule.color = color;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.borrow().is_empty()
    }

    /// Add `pattern` to the named rule; no-op when the rule doesn't exist
    pub fn upsert_pattern(&self, name: &str, pattern: Pattern) -> bool {
        let mut rules = self.rules.borrow_mut();
        match rules.iter_mut().find(|rule| rule.name == name) {
            Some(rule) => rule.patterns.insert(pattern),
            None => false,
        }
    }

    /// Append an empty rule unless one with this name exists; true if added
    pub fn insert_if_absent(&self, name: &str, color: GroupColor) -> bool {
        let mut rules = self.rules.borrow_mut();
        if rules.iter().any(|rule| rule.name == name) {
            return false;
        }
        rules.push(CategoryRule::new(name, color));
        true
    }

    /// Existing rule by name, or a new empty one, persisted right away
    pub async fn ensure_rule(&self, name: &str, color: GroupColor) -> CategoryRule {
        if self.insert_if_absent(name, color) {
            log::debug!("Created rule {:?} ({})", name, color);
            self.persist().await;
        }

        self.find_by_name(name)
            .unwrap_or_else(|| CategoryRule::new(name, color))
    }

    /// Union `patterns` into the named rule, creating it with `color` if needed
    pub fn merge_patterns(&self, name: &str, color: GroupColor, patterns: impl IntoIterator<Item = Pattern>) {
        let mut rules = self.rules.borrow_mut();
        match rules.iter_mut().find(|rule| rule.name == name) {
            Some(rule) => rule.patterns.extend(patterns),
            None => rules.push(CategoryRule::new(name, color).with_patterns(patterns)),
        }
    }

    /// Remove patterns matching `url` from every rule not named `name`
    pub fn remove_pattern_everywhere_except(&self, name: &str, url: &str) -> usize {
        self.rules
            .borrow_mut()
            .iter_mut()
            .filter(|rule| rule.name != name)
            .map(|rule| rule.remove_matching(url))
            .sum()
    }

    /// Remove patterns matching `url` from every rule
    pub fn remove_pattern_everywhere(&self, url: &str) -> usize {
        self.rules
            .borrow_mut()
            .iter_mut()
            .map(|rule| rule.remove_matching(url))
            .sum()
    }

    pub fn remove_rule(&self, name: &str) -> bool {
        let mut rules = self.rules.borrow_mut();
        let original_len = rules.len();
        rules.retain(|rule| rule.name != name);
        rules.len() < original_len
    }

    /// Replace the whole list, merging any repeated names so names stay unique
    pub fn replace_all(&self, records: Vec<RuleRecord>) {
        let mut merged: Vec<CategoryRule> = Vec::with_capacity(records.len());
        for rule in records.into_iter().map(CategoryRule::from_record) {
            match merged.iter_mut().find(|r| r.name == rule.name) {
                Some(existing) => existing.patterns.extend(rule.patterns),
                None => merged.push(rule),
            }
        }

        *self.rules.borrow_mut() = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStorage;
    use serde_json::json;

    fn store() -> (Rc<MemoryStorage>, RuleStore<MemoryStorage>) {
        let storage = Rc::new(MemoryStorage::new());
        let store = RuleStore::new(storage.clone(), "groupConfigs", "Others");
        (storage, store)
    }

    fn host(name: &str) -> Pattern {
        Pattern::hostname(name).unwrap()
    }

    #[tokio::test]
    async fn test_save_prunes_empty_rules() {
        let (storage, store) = store();
        store.insert_if_absent("Empty", GroupColor::Red);
        store.merge_patterns("Search", GroupColor::Blue, vec![host("google.com")]);

        store.save().await.unwrap();

        let reloaded = RuleStore::new(storage.clone(), "groupConfigs", "Others");
        assert!(reloaded.load().await);
        assert!(reloaded.find_by_name("Empty").is_none());
        assert!(reloaded.find_by_name("Search").is_some());
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_load_absent_or_malformed_keeps_state() {
        let (storage, store) = store();
        store.merge_patterns("Search", GroupColor::Blue, vec![host("google.com")]);

        assert!(!store.load().await);
        assert_eq!(store.len(), 1);

        storage.insert("groupConfigs", json!({"not": "a list"}));
        assert!(!store.load().await);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_load_replaces_wholesale() {
        let (storage, store) = store();
        store.merge_patterns("Old", GroupColor::Blue, vec![host("old.example")]);
        storage.insert(
            "groupConfigs",
            json!([
                {"name": "job", "color": "purple", "patterns": ["indeed\\.com"]},
                {"name": "job", "color": "purple", "patterns": ["glassdoor\\.com"]}
            ]),
        );

        assert!(store.load().await);
        assert!(store.find_by_name("Old").is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_name("job").unwrap().patterns.len(), 2);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_memory() {
        let (storage, store) = store();
        store.merge_patterns("Search", GroupColor::Blue, vec![host("google.com")]);
        storage.fail_writes(true);

        assert!(store.save().await.is_err());
        store.persist().await;
        assert_eq!(store.categorize("https://google.com"), "Search");
    }

    #[tokio::test]
    async fn test_ensure_rule_persists_new_rule_only() {
        let (storage, store) = store();
        let rule = store.ensure_rule("Dev", GroupColor::Green).await;
        assert_eq!(rule.color, GroupColor::Green);
        assert_eq!(storage.writes("groupConfigs"), 1);

        let rule = store.ensure_rule("Dev", GroupColor::Red).await;
        assert_eq!(rule.color, GroupColor::Green);
        assert_eq!(storage.writes("groupConfigs"), 1);
    }

    #[test]
    fn test_upsert_pattern_needs_existing_rule() {
        let (_, store) = store();
        assert!(!store.upsert_pattern("Dev", host("codepen.io")));
        assert!(store.is_empty());

        store.insert_if_absent("Dev", GroupColor::Green);
        assert!(store.upsert_pattern("Dev", host("codepen.io")));
        assert!(!store.upsert_pattern("Dev", host("codepen.io")));
        assert_eq!(store.find_by_name("Dev").unwrap().patterns.len(), 1);
    }

    #[test]
    fn test_remove_pattern_everywhere_except() {
        let (_, store) = store();
        store.merge_patterns("A", GroupColor::Blue, vec![host("github.com")]);
        store.merge_patterns("B", GroupColor::Red, vec![host("github.com"), host("gitlab.com")]);

        assert_eq!(store.remove_pattern_everywhere_except("A", "https://github.com/x"), 1);
        assert_eq!(store.find_by_name("A").unwrap().patterns.len(), 1);
        assert_eq!(store.find_by_name("B").unwrap().patterns.len(), 1);
    }

    #[test]
    fn test_remove_rule() {
        let (_, store) = store();
        store.merge_patterns("job", GroupColor::Purple, vec![host("indeed.com")]);
        assert!(store.remove_rule("job"));
        assert!(!store.remove_rule("job"));
        assert_eq!(store.categorize("https://indeed.com"), "Others");
    }

    #[tokio::test]
    async fn test_round_trip_through_storage() {
        let (storage, store) = store();
        store.merge_patterns("Social", GroupColor::Pink, vec![host("reddit.com"), host("twitter.com")]);
        store.merge_patterns("Search", GroupColor::Blue, vec![host("google.com")]);
        store.save().await.unwrap();

        let reloaded = RuleStore::new(storage, "groupConfigs", "Others");
        reloaded.load().await;
        assert_eq!(reloaded.rules(), store.rules());
    }
}
