/// Chrome extension APIs behind the collaborator traits, plus background wiring
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::commands::{Command, CommandResponse};
use crate::config::GrouperConfig;
use crate::error::{GrouperError, Result};
use crate::host::{
    GroupId, GroupQuery, GroupUpdate, HostGroup, KeyValueStore, Tab, TabHost, TabId, TabQuery, Timer, Window,
    WindowId,
};
use crate::router::{HostEvent, Router};

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    fn hasTabGroups() -> bool;

    #[wasm_bindgen(catch)]
    async fn queryGroups(query: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getGroup(group_id: i32) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createGroup(tab_ids: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn addToGroup(tab_ids: JsValue, group_id: i32) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateGroup(group_id: i32, update: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryTabs(query: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeTabs(tab_ids: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getAllWindows() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createWindow() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createTab(window_id: i32, url: &str, pinned: bool) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sleep(ms: u32) -> std::result::Result<JsValue, JsValue>;

    fn registerEventListener(callback: &js_sys::Function);

    fn registerCommandHandler(callback: &js_sys::Function);
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| GrouperError::host(format!("Failed to serialize: {:?}", e)))
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value).map_err(|e| GrouperError::host(format!("Failed to parse: {:?}", e)))
}

fn host_error(e: JsValue) -> GrouperError {
    GrouperError::host(format!("{:?}", e))
}

/// `chrome.tabs`, `chrome.tabGroups` and `chrome.windows`
pub struct ChromeHost {
    groups_available: bool,
}

impl ChromeHost {
    /// Probe the tab-groups API once
    pub fn detect() -> ChromeHost {
        let groups_available = hasTabGroups();
        if !groups_available {
            log::warn!("Tab Groups API is not available. Grouping tabs is not supported.");
        }
        ChromeHost { groups_available }
    }
}

impl TabHost for ChromeHost {
    fn supports_groups(&self) -> bool {
        self.groups_available
    }

    async fn query_groups(&self, query: &GroupQuery) -> Result<Vec<HostGroup>> {
        from_js(queryGroups(to_js(query)?).await.map_err(host_error)?)
    }

    async fn get_group(&self, group_id: GroupId) -> Result<HostGroup> {
        from_js(getGroup(group_id).await.map_err(host_error)?)
    }

    async fn create_group(&self, tab_ids: &[TabId]) -> Result<GroupId> {
        from_js(createGroup(to_js(tab_ids)?).await.map_err(host_error)?)
    }

    async fn add_to_group(&self, tab_ids: &[TabId], group_id: GroupId) -> Result<()> {
        addToGroup(to_js(tab_ids)?, group_id).await.map_err(host_error)?;
        Ok(())
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<HostGroup> {
        from_js(updateGroup(group_id, to_js(update)?).await.map_err(host_error)?)
    }

    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>> {
        from_js(queryTabs(to_js(query)?).await.map_err(host_error)?)
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<()> {
        removeTabs(to_js(tab_ids)?).await.map_err(host_error)?;
        Ok(())
    }

    async fn query_windows(&self) -> Result<Vec<Window>> {
        from_js(getAllWindows().await.map_err(host_error)?)
    }

    async fn create_window(&self) -> Result<WindowId> {
        from_js(createWindow().await.map_err(host_error)?)
    }

    async fn create_tab(&self, window_id: WindowId, url: &str, pinned: bool) -> Result<Tab> {
        from_js(createTab(window_id, url, pinned).await.map_err(host_error)?)
    }
}

/// `chrome.storage.local`
pub struct ChromeStorage;

impl KeyValueStore for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let value = getStorage(key)
            .await
            .map_err(|e| GrouperError::storage(format!("Failed to get storage: {:?}", e)))?;

        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        serde_wasm_bindgen::from_value(value)
            .map(Some)
            .map_err(|e| GrouperError::storage(format!("Failed to parse storage: {:?}", e)))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let value = to_js(&value)?;
        setStorage(key, value)
            .await
            .map_err(|e| GrouperError::storage(format!("Failed to save storage: {:?}", e)))?;
        Ok(())
    }
}

/// `Date.now()` and `setTimeout`
pub struct BrowserTimer;

impl Timer for BrowserTimer {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    async fn sleep(&self, ms: u32) {
        if let Err(e) = sleep(ms).await {
            log::error!("Timer failed: {:?}", e);
        }
    }
}

type ChromeRouter = Router<ChromeHost, ChromeStorage, BrowserTimer>;

/// Build the router, hydrate the rules and attach to the browser's events.
///
/// The JS bridge queues events fired before this completes.
pub async fn run_background() {
    let storage = Rc::new(ChromeStorage);
    let config = GrouperConfig::load(storage.as_ref()).await;
    let router: Rc<ChromeRouter> = Rc::new(Router::new(
        Rc::new(ChromeHost::detect()),
        storage,
        Rc::new(BrowserTimer),
        config,
    ));
    router.hydrate().await;

    let events = router.clone();
    let on_event = Closure::<dyn FnMut(JsValue)>::new(move |raw: JsValue| {
        let event: HostEvent = match from_js(raw) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Ignoring unknown event: {}", e);
                return;
            }
        };

        let router = events.clone();
        spawn_local(async move {
            let periodic = event.starts_interval();
            router.handle(event).await;
            if periodic {
                router.run_periodic_snapshots().await;
            }
        });
    });
    registerEventListener(on_event.as_ref().unchecked_ref());
    on_event.forget();

    let commands = router.clone();
    let on_command = Closure::<dyn FnMut(JsValue) -> js_sys::Promise>::new(move |raw: JsValue| {
        let router = commands.clone();
        future_to_promise(async move {
            let response = match from_js::<Command>(raw) {
                Ok(command) => router.execute(command).await,
                Err(e) => CommandResponse::failed("Unknown command", e),
            };
            to_js(&response).map_err(|e| JsValue::from_str(&e.to_string()))
        })
    });
    registerCommandHandler(on_command.as_ref().unchecked_ref());
    on_command.forget();

    log::info!("Tab Grouper background ready");
}
