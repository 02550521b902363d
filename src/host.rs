/// Collaborator interfaces: the browser that owns tabs, and the key-value store
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::GroupColor;

pub type TabId = i32;
pub type GroupId = i32;
pub type WindowId = i32;

/// Group id the browser reports for a tab outside any group
pub const NO_GROUP: GroupId = -1;

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default = "no_group")]
    pub group_id: GroupId,
    #[serde(default)]
    pub window_id: WindowId,
}

fn no_group() -> GroupId {
    NO_GROUP
}

impl Tab {
    pub fn new(id: TabId, url: impl Into<String>) -> Tab {
        Tab {
            id,
            url: url.into(),
            title: String::new(),
            pinned: false,
            group_id: NO_GROUP,
            window_id: 0,
        }
    }

    pub fn group(&self) -> Option<GroupId> {
        (self.group_id != NO_GROUP).then_some(self.group_id)
    }
}

/// A tab group as the browser reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostGroup {
    pub id: GroupId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub color: GroupColor,
    #[serde(default)]
    pub window_id: WindowId,
}

/// A browser window with its tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
}

impl GroupQuery {
    pub fn all() -> GroupQuery {
        GroupQuery::default()
    }

    pub fn titled(title: impl Into<String>) -> GroupQuery {
        GroupQuery {
            title: Some(title.into()),
            ..GroupQuery::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_window: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
}

impl TabQuery {
    pub fn current_window() -> TabQuery {
        TabQuery {
            current_window: Some(true),
            ..TabQuery::default()
        }
    }

    pub fn in_group(group_id: GroupId) -> TabQuery {
        TabQuery {
            group_id: Some(group_id),
            ..TabQuery::default()
        }
    }

    pub fn in_window(window_id: WindowId) -> TabQuery {
        TabQuery {
            window_id: Some(window_id),
            ..TabQuery::default()
        }
    }
}

/// Display metadata applied to a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupUpdate {
    pub title: String,
    pub color: GroupColor,
}

/// The browser: tabs, windows and tab groups.
///
/// Every method is an await point; implementations are single-threaded
/// so futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait TabHost {
    /// Whether the tab-groups API exists in this environment
    fn supports_groups(&self) -> bool;

    async fn query_groups(&self, query: &GroupQuery) -> Result<Vec<HostGroup>>;

    async fn get_group(&self, group_id: GroupId) -> Result<HostGroup>;

    /// Put `tab_ids` into a brand-new group
    async fn create_group(&self, tab_ids: &[TabId]) -> Result<GroupId>;

    async fn add_to_group(&self, tab_ids: &[TabId], group_id: GroupId) -> Result<()>;

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<HostGroup>;

    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>>;

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<()>;

    /// All windows, populated with their tabs
    async fn query_windows(&self) -> Result<Vec<Window>>;

    async fn create_window(&self) -> Result<WindowId>;

    async fn create_tab(&self, window_id: WindowId, url: &str, pinned: bool) -> Result<Tab>;
}

/// Whole-value key-value persistence, last write wins
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Wall clock and sleeping, injected so tests can fake time
#[allow(async_fn_in_trait)]
pub trait Timer {
    fn now_ms(&self) -> f64;

    async fn sleep(&self, ms: u32);
}
