/// Window/tab layout snapshots for save and restore
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::{GroupId, KeyValueStore, TabHost, TabQuery, Window, WindowId};

/// A saved browser window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWindow {
    pub id: WindowId,
    pub tabs: Vec<SavedTab>,
}

/// A saved tab within a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTab {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub group_id: GroupId,
}

impl From<&Window> for SavedWindow {
    fn from(window: &Window) -> Self {
        SavedWindow {
            id: window.id,
            tabs: window
                .tabs
                .iter()
                .map(|tab| SavedTab {
                    url: tab.url.clone(),
                    title: tab.title.clone(),
                    pinned: tab.pinned,
                    group_id: tab.group_id,
                })
                .collect(),
        }
    }
}

/// Serializes the whole layout into one storage value and back
pub struct Snapshots<H, S> {
    host: Rc<H>,
    storage: Rc<S>,
    key: String,
}

impl<H: TabHost, S: KeyValueStore> Snapshots<H, S> {
    pub fn new(host: Rc<H>, storage: Rc<S>, key: impl Into<String>) -> Snapshots<H, S> {
        Snapshots {
            host,
            storage,
            key: key.into(),
        }
    }

    /// Save every window and its tabs, replacing the previous snapshot
    pub async fn save(&self) -> Result<usize> {
        let windows = self.host.query_windows().await?;
        let saved: Vec<SavedWindow> = windows.iter().map(SavedWindow::from).collect();

        self.storage.set(&self.key, serde_json::to_value(&saved)?).await?;
        log::info!("Tabs and windows saved automatically ({} windows)", saved.len());
        Ok(saved.len())
    }

    pub async fn load(&self) -> Result<Vec<SavedWindow>> {
        match self.storage.get(&self.key).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Reopen every saved window in a new window; returns the tabs opened.
    ///
    /// A tab that fails to open is logged and skipped.
    pub async fn restore(&self) -> Result<usize> {
        let saved = self.load().await?;
        let mut restored = 0;

        for window in &saved {
            let window_id = self.host.create_window().await?;

            for tab in &window.tabs {
                match self.host.create_tab(window_id, &tab.url, tab.pinned).await {
                    Ok(_) => restored += 1,
                    Err(e) => log::error!("Failed to restore {:?}: {}", tab.url, e),
                }
            }

            // Drop the blank tab the new window opened with
            let tabs = self.host.query_tabs(&TabQuery::in_window(window_id)).await?;
            if tabs.len() > 1 {
                self.host.remove_tabs(&[tabs[0].id]).await?;
            }
        }

        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHost, MemoryStorage};

    fn snapshots() -> (Rc<FakeHost>, Rc<MemoryStorage>, Snapshots<FakeHost, MemoryStorage>) {
        let host = Rc::new(FakeHost::new());
        let storage = Rc::new(MemoryStorage::new());
        let snapshots = Snapshots::new(host.clone(), storage.clone(), "savedWindows");
        (host, storage, snapshots)
    }

    #[tokio::test]
    async fn test_save_captures_every_window() {
        let (host, storage, snapshots) = snapshots();
        host.add_tab("https://github.com");
        host.add_tab_in(7, "https://google.com");

        assert_eq!(snapshots.save().await.unwrap(), 2);

        let saved: Vec<SavedWindow> = serde_json::from_value(storage.value("savedWindows").unwrap()).unwrap();
        assert_eq!(saved[0].tabs[0].url, "https://github.com");
        assert_eq!(saved[1].id, 7);
        assert_eq!(saved[1].tabs[0].group_id, -1);
    }

    #[tokio::test]
    async fn test_restore_reopens_tabs_and_drops_blank() {
        let (host, storage, snapshots) = snapshots();
        storage.insert(
            "savedWindows",
            serde_json::json!([{
                "id": 3,
                "tabs": [
                    {"url": "https://github.com", "title": "GitHub", "pinned": true, "groupId": -1},
                    {"url": "https://docs.rs", "title": "Docs", "pinned": false, "groupId": 12}
                ]
            }]),
        );

        assert_eq!(snapshots.restore().await.unwrap(), 2);

        let urls: Vec<String> = host.tabs().into_iter().map(|t| t.url).collect();
        assert_eq!(urls, vec!["https://github.com".to_string(), "https://docs.rs".to_string()]);
        assert!(host.tabs()[0].pinned);
    }

    #[tokio::test]
    async fn test_restore_empty_snapshot() {
        let (host, _, snapshots) = snapshots();
        assert_eq!(snapshots.restore().await.unwrap(), 0);
        assert!(host.calls().is_empty());
    }
}
