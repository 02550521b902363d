/// In-memory test doubles for the browser, storage and clock
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::{GrouperError, Result};
use crate::host::{
    GroupId, GroupQuery, GroupUpdate, HostGroup, KeyValueStore, NO_GROUP, Tab, TabHost, TabId, TabQuery, Timer,
    Window, WindowId,
};
use crate::rules::GroupColor;

pub const CURRENT_WINDOW: WindowId = 1;

#[derive(Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, serde_json::Value>>,
    writes: RefCell<HashMap<String, usize>>,
    fail_writes: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: serde_json::Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.values.borrow().get(key).cloned()
    }

    pub fn writes(&self, key: &str) -> usize {
        self.writes.borrow().get(key).copied().unwrap_or(0)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        if self.fail_writes.get() {
            return Err(GrouperError::storage("quota exceeded"));
        }
        *self.writes.borrow_mut().entry(key.to_string()).or_insert(0) += 1;
        self.insert(key, value);
        Ok(())
    }
}

struct HostState {
    tabs: Vec<Tab>,
    groups: Vec<HostGroup>,
    windows: Vec<WindowId>,
    next_id: i32,
}

impl HostState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    // The browser drops a group as soon as its last tab leaves
    fn prune_groups(&mut self) {
        let tabs = &self.tabs;
        self.groups.retain(|g| tabs.iter().any(|t| t.group_id == g.id));
    }
}

/// A browser with windows, tabs and groups held in memory
pub struct FakeHost {
    state: RefCell<HostState>,
    supports_groups: bool,
    fail_grouping: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost {
            state: RefCell::new(HostState {
                tabs: Vec::new(),
                groups: Vec::new(),
                windows: vec![CURRENT_WINDOW],
                next_id: 100,
            }),
            supports_groups: true,
            fail_grouping: Cell::new(false),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn without_groups() -> Self {
        FakeHost {
            supports_groups: false,
            ..FakeHost::new()
        }
    }

    pub fn fail_grouping(&self, fail: bool) {
        self.fail_grouping.set(fail);
    }

    pub fn add_tab(&self, url: &str) -> Tab {
        self.add_tab_in(CURRENT_WINDOW, url)
    }

    pub fn add_tab_in(&self, window_id: WindowId, url: &str) -> Tab {
        let mut state = self.state.borrow_mut();
        if !state.windows.contains(&window_id) {
            state.windows.push(window_id);
        }
        let mut tab = Tab::new(state.next_id(), url);
        tab.window_id = window_id;
        state.tabs.push(tab.clone());
        tab
    }

    pub fn add_group(&self, title: &str, color: GroupColor, tab_ids: &[TabId]) -> GroupId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.groups.push(HostGroup {
            id,
            title: title.to_string(),
            color,
            window_id: CURRENT_WINDOW,
        });
        for tab in state.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
            tab.group_id = id;
        }
        id
    }

    pub fn tab(&self, id: TabId) -> Option<Tab> {
        self.state.borrow().tabs.iter().find(|t| t.id == id).cloned()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.state.borrow().tabs.clone()
    }

    pub fn groups(&self) -> Vec<HostGroup> {
        self.state.borrow().groups.clone()
    }

    pub fn group_titled(&self, title: &str) -> Option<HostGroup> {
        self.state.borrow().groups.iter().find(|g| g.title == title).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn check_grouping(&self) -> Result<()> {
        if self.fail_grouping.get() {
            Err(GrouperError::host("grouping rejected"))
        } else {
            Ok(())
        }
    }
}

impl TabHost for FakeHost {
    fn supports_groups(&self) -> bool {
        self.supports_groups
    }

    async fn query_groups(&self, query: &GroupQuery) -> Result<Vec<HostGroup>> {
        Ok(self
            .state
            .borrow()
            .groups
            .iter()
            .filter(|g| query.title.as_ref().is_none_or(|t| &g.title == t))
            .filter(|g| query.window_id.is_none_or(|w| g.window_id == w))
            .cloned()
            .collect())
    }

    async fn get_group(&self, group_id: GroupId) -> Result<HostGroup> {
        self.state
            .borrow()
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or(GrouperError::MissingHost { kind: "group", id: group_id })
    }

    async fn create_group(&self, tab_ids: &[TabId]) -> Result<GroupId> {
        self.record(format!("create_group {:?}", tab_ids));
        self.check_grouping()?;

        let mut state = self.state.borrow_mut();
        let window_id = state
            .tabs
            .iter()
            .find(|t| tab_ids.contains(&t.id))
            .map(|t| t.window_id)
            .ok_or(GrouperError::MissingHost { kind: "tab", id: tab_ids.first().copied().unwrap_or(NO_GROUP) })?;
        let id = state.next_id();
        state.groups.push(HostGroup {
            id,
            title: String::new(),
            color: GroupColor::Grey,
            window_id,
        });
        for tab in state.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
            tab.group_id = id;
        }
        state.prune_groups();
        Ok(id)
    }

    async fn add_to_group(&self, tab_ids: &[TabId], group_id: GroupId) -> Result<()> {
        self.record(format!("add_to_group {:?} {}", tab_ids, group_id));
        self.check_grouping()?;

        let mut state = self.state.borrow_mut();
        if !state.groups.iter().any(|g| g.id == group_id) {
            return Err(GrouperError::MissingHost { kind: "group", id: group_id });
        }
        for tab in state.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
            tab.group_id = group_id;
        }
        state.prune_groups();
        Ok(())
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<HostGroup> {
        self.record(format!("update_group {} {} {}", group_id, update.title, update.color));

        let mut state = self.state.borrow_mut();
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or(GrouperError::MissingHost { kind: "group", id: group_id })?;
        group.title = update.title.clone();
        group.color = update.color;
        Ok(group.clone())
    }

    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>> {
        Ok(self
            .state
            .borrow()
            .tabs
            .iter()
            .filter(|t| query.current_window != Some(true) || t.window_id == CURRENT_WINDOW)
            .filter(|t| query.group_id.is_none_or(|g| t.group_id == g))
            .filter(|t| query.window_id.is_none_or(|w| t.window_id == w))
            .cloned()
            .collect())
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<()> {
        self.record(format!("remove_tabs {:?}", tab_ids));

        let mut state = self.state.borrow_mut();
        state.tabs.retain(|t| !tab_ids.contains(&t.id));
        state.prune_groups();
        Ok(())
    }

    async fn query_windows(&self) -> Result<Vec<Window>> {
        let state = self.state.borrow();
        Ok(state
            .windows
            .iter()
            .map(|&id| Window {
                id,
                tabs: state.tabs.iter().filter(|t| t.window_id == id).cloned().collect(),
            })
            .collect())
    }

    async fn create_window(&self) -> Result<WindowId> {
        let id = self.state.borrow_mut().next_id();
        self.state.borrow_mut().windows.push(id);
        // New windows open with one blank tab
        self.add_tab_in(id, "chrome://newtab/");
        Ok(id)
    }

    async fn create_tab(&self, window_id: WindowId, url: &str, pinned: bool) -> Result<Tab> {
        let tab = self.add_tab_in(window_id, url);
        let mut state = self.state.borrow_mut();
        let stored = state
            .tabs
            .iter_mut()
            .find(|t| t.id == tab.id)
            .ok_or(GrouperError::MissingHost { kind: "tab", id: tab.id })?;
        stored.pinned = pinned;
        Ok(stored.clone())
    }
}

/// A clock that jumps forward instead of waiting
#[derive(Default)]
pub struct FakeTimer {
    now: Cell<f64>,
    sleeps: RefCell<Vec<u32>>,
}

impl FakeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }
}

impl Timer for FakeTimer {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    async fn sleep(&self, ms: u32) {
        self.sleeps.borrow_mut().push(ms);
        self.advance(ms as f64);
        // Let other tasks in the test run before "waking up"
        tokio::task::yield_now().await;
    }
}
