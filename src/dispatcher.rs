/// Tab dispatch: put tabs into the group of their category
use std::rc::Rc;

use crate::error::{GrouperError, Result};
use crate::host::{GroupQuery, GroupUpdate, HostGroup, KeyValueStore, Tab, TabHost, TabId, TabQuery};
use crate::reconciler::Reconciler;
use crate::rules::GroupColor;
use crate::store::RuleStore;

pub struct Dispatcher<H, S> {
    host: Rc<H>,
    rules: Rc<RuleStore<S>>,
    reconciler: Rc<Reconciler<H, S>>,
}

impl<H: TabHost, S: KeyValueStore> Dispatcher<H, S> {
    pub fn new(host: Rc<H>, rules: Rc<RuleStore<S>>, reconciler: Rc<Reconciler<H, S>>) -> Dispatcher<H, S> {
        Dispatcher { host, rules, reconciler }
    }

    /// Group a single tab by its category and learn from the outcome.
    ///
    /// Returns the category the tab was placed in. Failures are logged
    /// and reported as `None`.
    pub async fn place_tab(&self, tab: &Tab) -> Option<String> {
        if !self.host.supports_groups() {
            log::warn!("Tab Groups API is not available. Grouping tabs is not supported.");
            return None;
        }

        let category = self.rules.categorize(&tab.url);
        let color = self.rules.color_of(&category);

        if let Err(e) = self.group_tab(tab, &category, color).await {
            log::error!("Error grouping tab {} into {:?}: {}", tab.id, category, e);
            return None;
        }

        self.reconciler.on_tab_joined_group(&category, color, &tab.url).await;
        Some(category)
    }

    async fn group_tab(&self, tab: &Tab, category: &str, color: GroupColor) -> Result<()> {
        let groups = self.host.query_groups(&GroupQuery::titled(category)).await?;

        match find_group(&groups, category, tab.window_id) {
            Some(group) if tab.group_id == group.id => {
                log::debug!("Tab {} already in {:?}", tab.id, category);
            }
            Some(group) => {
                self.host.add_to_group(&[tab.id], group.id).await?;
            }
            None => {
                let group_id = self.host.create_group(&[tab.id]).await?;
                self.label_group(group_id, category, color).await?;
            }
        }

        Ok(())
    }

    /// Group every tab of the current window
    pub async fn place_current_window(&self) -> Result<usize> {
        if !self.host.supports_groups() {
            log::warn!("Tab Groups API is not available. Grouping tabs is not supported.");
            return Err(GrouperError::GroupsUnsupported);
        }

        let tabs = self.host.query_tabs(&TabQuery::current_window()).await?;
        self.place_tabs(&tabs).await
    }

    /// Group a batch of tabs, one host call per category.
    ///
    /// Tabs already in their category's group are left alone. A failure for
    /// one category is logged and the others still go through. Returns the
    /// number of tabs that were moved.
    pub async fn place_tabs(&self, tabs: &[Tab]) -> Result<usize> {
        if !self.host.supports_groups() {
            log::warn!("Tab Groups API is not available. Grouping tabs is not supported.");
            return Err(GrouperError::GroupsUnsupported);
        }

        let groups = self.host.query_groups(&GroupQuery::all()).await?;
        let mut moved = 0;

        for (category, members) in partition_by_category(tabs, |url| self.rules.categorize(url)) {
            let window_id = members[0].window_id;
            let existing = find_group(&groups, &category, window_id);

            match self.place_category(&category, &members, existing).await {
                Ok(count) => moved += count,
                Err(e) => log::error!("Error grouping {} tabs into {:?}: {}", members.len(), category, e),
            }
        }

        self.rules.persist().await;
        Ok(moved)
    }

    async fn place_category(&self, category: &str, members: &[&Tab], existing: Option<&HostGroup>) -> Result<usize> {
        match existing {
            Some(group) => {
                let ungrouped: Vec<TabId> = members
                    .iter()
                    .filter(|tab| tab.group_id != group.id)
                    .map(|tab| tab.id)
                    .collect();

                if !ungrouped.is_empty() {
                    self.host.add_to_group(&ungrouped, group.id).await?;
                }
                Ok(ungrouped.len())
            }
            None => {
                let tab_ids: Vec<TabId> = members.iter().map(|tab| tab.id).collect();
                let group_id = self.host.create_group(&tab_ids).await?;
                self.label_group(group_id, category, self.rules.color_of(category)).await?;
                Ok(tab_ids.len())
            }
        }
    }

    async fn label_group(&self, group_id: i32, category: &str, color: GroupColor) -> Result<()> {
        let update = GroupUpdate {
            title: category.to_string(),
            color,
        };
        self.host.update_group(group_id, &update).await?;
        log::info!("Created group {:?} ({})", category, color);
        Ok(())
    }
}

/// Prefer a same-titled group in the tab's own window so grouping never
/// drags a tab into another window
fn find_group<'a>(groups: &'a [HostGroup], title: &str, window_id: i32) -> Option<&'a HostGroup> {
    groups.iter().find(|g| g.title == title && g.window_id == window_id)
}

/// Split tabs by category, keeping categories in first-seen order
fn partition_by_category<'a>(tabs: &'a [Tab], categorize: impl Fn(&str) -> String) -> Vec<(String, Vec<&'a Tab>)> {
    let mut partitions: Vec<(String, Vec<&Tab>)> = Vec::new();

    for tab in tabs {
        let category = categorize(&tab.url);
        match partitions.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push(tab),
            None => partitions.push((category, vec![tab])),
        }
    }

    partitions
}
