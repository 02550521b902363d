/// Category reconciliation: keep the rules in step with the browser's groups
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{GrouperError, Result};
use crate::host::{GroupId, GroupQuery, HostGroup, KeyValueStore, Tab, TabHost, TabQuery};
use crate::pattern::Pattern;
use crate::rules::GroupColor;
use crate::store::RuleStore;

/// Learns patterns from what the user (or the dispatcher) does with groups.
///
/// A learned pattern is always the hostname of the observed URL, so one
/// grouped tab teaches the whole domain.
pub struct Reconciler<H, S> {
    host: Rc<H>,
    rules: Rc<RuleStore<S>>,
}

impl<H: TabHost, S: KeyValueStore> Reconciler<H, S> {
    pub fn new(host: Rc<H>, rules: Rc<RuleStore<S>>) -> Reconciler<H, S> {
        Reconciler { host, rules }
    }

    /// Query every live group and its tabs, then import them
    pub async fn sync_from_host(&self) -> Result<()> {
        if !self.host.supports_groups() {
            return Err(GrouperError::GroupsUnsupported);
        }

        let groups = self.host.query_groups(&GroupQuery::all()).await?;
        let mut tabs_per_group = HashMap::new();
        for group in &groups {
            match self.host.query_tabs(&TabQuery::in_group(group.id)).await {
                Ok(tabs) => {
                    tabs_per_group.insert(group.id, tabs);
                }
                Err(e) => log::error!("Failed to list tabs of group {:?}: {}", group.title, e),
            }
        }

        self.import_from_host(&groups, &tabs_per_group).await;
        Ok(())
    }

    /// Union each live group's hostnames into the rule of the same name.
    ///
    /// Rules without a live group are left as they are.
    pub async fn import_from_host(&self, groups: &[HostGroup], tabs_per_group: &HashMap<GroupId, Vec<Tab>>) {
        for group in groups {
            if !self.is_category(&group.title) {
                log::debug!("Not importing group {} titled {:?}", group.id, group.title);
                continue;
            }

            let patterns: Vec<Pattern> = tabs_per_group
                .get(&group.id)
                .map(|tabs| tabs.iter().filter_map(|tab| learn(&tab.url)).collect())
                .unwrap_or_default();

            log::debug!("Importing {} patterns into {:?}", patterns.len(), group.title);
            self.rules.merge_patterns(&group.title, group.color, patterns);
        }

        self.rules.persist().await;
    }

    /// A tab with `url` now sits in the group `group_name`.
    ///
    /// Its hostname becomes a pattern of that rule and is taken away from
    /// every other rule.
    pub async fn on_tab_joined_group(&self, group_name: &str, group_color: GroupColor, url: &str) {
        if group_name == self.rules.fallback() {
            // Parking a tab in the fallback group means it has no category
            return self.on_tab_left_group(url).await;
        }
        if !self.is_category(group_name) {
            log::debug!("Ignoring tab joining untitled group");
            return;
        }

        self.rules.ensure_rule(group_name, group_color).await;

        let Some(pattern) = learn(url) else {
            return;
        };

        if self.rules.upsert_pattern(group_name, pattern) {
            log::info!("Learned {} for {:?}", url, group_name);
        }
        let removed = self.rules.remove_pattern_everywhere_except(group_name, url);
        if removed > 0 {
            log::debug!("Dropped {} patterns matching {} from other rules", removed, url);
        }

        self.rules.persist().await;
    }

    /// A tab with `url` left its group: forget every pattern matching it
    pub async fn on_tab_left_group(&self, url: &str) {
        let removed = self.rules.remove_pattern_everywhere(url);
        log::debug!("Tab {} left its group, {} patterns removed", url, removed);
        self.rules.persist().await;
    }

    pub async fn on_group_removed(&self, group_name: &str) {
        if !self.is_category(group_name) {
            return;
        }

        if self.rules.remove_rule(group_name) {
            log::info!("Group {:?} removed, deleting its rule", group_name);
        }
        self.rules.persist().await;
    }

    /// Title or color of a group changed in the browser
    pub async fn on_group_metadata_updated(&self, group_name: &str, group_color: GroupColor) {
        if !self.is_category(group_name) {
            return;
        }

        self.rules.ensure_rule(group_name, group_color).await;
        if self.rules.set_color(group_name, group_color) {
            self.rules.persist().await;
        }
    }

    fn is_category(&self, name: &str) -> bool {
        !name.trim().is_empty() && name != self.rules.fallback()
    }
}

fn learn(url: &str) -> Option<Pattern> {
    match Pattern::from_url(url) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            log::warn!("Not learning from {:?}: {}", url, e);
            None
        }
    }
}
