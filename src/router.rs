/// Event routing: browser lifecycle notifications → dispatcher / reconciler
use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::config::GrouperConfig;
use crate::debounce::{Debouncer, Interval};
use crate::dispatcher::Dispatcher;
use crate::host::{GroupId, HostGroup, KeyValueStore, NO_GROUP, Tab, TabHost, Timer};
use crate::reconciler::Reconciler;
use crate::rules::default_rules;
use crate::snapshot::Snapshots;
use crate::store::RuleStore;

/// A lifecycle notification from the browser, as forwarded by the JS bridge
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostEvent {
    TabCreated {
        tab: Tab,
    },
    TabUpdated {
        tab: Tab,
        #[serde(rename = "changeInfo", default)]
        change: TabChange,
    },
    TabRemoved,
    TabMoved,
    TabAttached,
    TabDetached,
    WindowCreated,
    WindowRemoved,
    GroupRemoved {
        group: HostGroup,
    },
    GroupUpdated {
        group: HostGroup,
    },
    Startup,
    Installed,
    Suspend,
}

impl HostEvent {
    /// Events after which the periodic snapshot loop should run
    pub fn starts_interval(&self) -> bool {
        matches!(self, HostEvent::Startup | HostEvent::Installed)
    }
}

/// The `changeInfo` part of a tab update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabChange {
    pub status: Option<String>,
    pub group_id: Option<GroupId>,
}

/// Owns every component and the two snapshot timers.
///
/// Handlers run as independent tasks and may interleave at host and
/// storage calls.
pub struct Router<H, S, T> {
    pub(crate) host: Rc<H>,
    pub(crate) rules: Rc<RuleStore<S>>,
    pub(crate) reconciler: Rc<Reconciler<H, S>>,
    pub(crate) dispatcher: Rc<Dispatcher<H, S>>,
    pub(crate) snapshots: Rc<Snapshots<H, S>>,
    timer: Rc<T>,
    config: GrouperConfig,
    debouncer: RefCell<Debouncer>,
    interval: RefCell<Interval>,
}

impl<H: TabHost, S: KeyValueStore, T: Timer> Router<H, S, T> {
    pub fn new(host: Rc<H>, storage: Rc<S>, timer: Rc<T>, config: GrouperConfig) -> Router<H, S, T> {
        let rules = Rc::new(RuleStore::new(
            storage.clone(),
            config.rules_key.clone(),
            config.fallback_category.clone(),
        ));
        let reconciler = Rc::new(Reconciler::new(host.clone(), rules.clone()));
        let dispatcher = Rc::new(Dispatcher::new(host.clone(), rules.clone(), reconciler.clone()));
        let snapshots = Rc::new(Snapshots::new(host.clone(), storage, config.snapshot_key.clone()));

        Router {
            host,
            rules,
            reconciler,
            dispatcher,
            snapshots,
            timer,
            debouncer: RefCell::new(Debouncer::new(config.snapshot_debounce_ms)),
            interval: RefCell::new(Interval::default()),
            config,
        }
    }

    pub fn rules(&self) -> &Rc<RuleStore<S>> {
        &self.rules
    }

    /// Pull the persisted rules into memory
    pub async fn hydrate(&self) {
        self.rules.load().await;
    }

    pub async fn handle(&self, event: HostEvent) {
        log::debug!("Handling {:?}", event);

        match event {
            HostEvent::TabCreated { tab } => {
                let ticket = self.schedule_snapshot_save();
                // Give the tab a moment to load its initial URL
                self.timer.sleep(self.config.placement_delay_ms).await;
                self.dispatcher.place_tab(&tab).await;
                self.settle_snapshot(ticket).await;
            }
            HostEvent::TabUpdated { tab, change } => self.on_tab_updated(tab, change).await,
            HostEvent::TabRemoved
            | HostEvent::TabMoved
            | HostEvent::TabAttached
            | HostEvent::TabDetached
            | HostEvent::WindowCreated
            | HostEvent::WindowRemoved => {
                let ticket = self.schedule_snapshot_save();
                self.settle_snapshot(ticket).await;
            }
            HostEvent::GroupRemoved { group } => self.reconciler.on_group_removed(&group.title).await,
            HostEvent::GroupUpdated { group } => {
                self.reconciler.on_group_metadata_updated(&group.title, group.color).await
            }
            HostEvent::Startup => self.on_startup(false).await,
            HostEvent::Installed => self.on_startup(true).await,
            HostEvent::Suspend => {
                log::info!("Suspending, stopping periodic snapshots");
                self.interval.borrow_mut().stop();
            }
        }
    }

    async fn on_tab_updated(&self, tab: Tab, change: TabChange) {
        match change.group_id {
            Some(NO_GROUP) => self.reconciler.on_tab_left_group(&tab.url).await,
            Some(group_id) => match self.host.get_group(group_id).await {
                Ok(group) => {
                    self.reconciler
                        .on_tab_joined_group(&group.title, group.color, &tab.url)
                        .await
                }
                Err(e) => log::error!("Failed to look up group {}: {}", group_id, e),
            },
            None => {}
        }

        if change.status.as_deref() == Some("complete") {
            let ticket = self.schedule_snapshot_save();
            self.dispatcher.place_tab(&tab).await;
            self.settle_snapshot(ticket).await;
        }
    }

    async fn on_startup(&self, installed: bool) {
        if installed && self.config.seed_default_rules && self.rules.records().is_empty() {
            log::info!("Seeding built-in categories");
            self.rules.replace_all(default_rules());
            self.rules.persist().await;
        }

        if let Err(e) = self.reconciler.sync_from_host().await {
            log::warn!("Could not import existing groups: {}", e);
        }
        if let Err(e) = self.dispatcher.place_current_window().await {
            log::warn!("Could not group tabs: {}", e);
        }
        self.save_snapshot().await;

        self.interval.borrow_mut().start();
    }

    /// Save the snapshot every interval until suspended or restarted
    pub async fn run_periodic_snapshots(&self) {
        let Some(generation) = self.interval.borrow().current() else {
            return;
        };

        loop {
            self.timer.sleep(self.config.snapshot_interval_ms).await;
            if !self.interval.borrow().is_running(generation) {
                log::debug!("Periodic snapshots {} stopped", generation);
                break;
            }
            self.save_snapshot().await;
        }
    }

    /// Push the snapshot deadline out; returns the ticket to settle
    pub fn schedule_snapshot_save(&self) -> u64 {
        self.debouncer.borrow_mut().schedule(self.timer.now_ms())
    }

    /// Wait out the quiet period, then save unless a newer event took over
    pub async fn settle_snapshot(&self, ticket: u64) {
        let Some(remaining) = self.debouncer.borrow().remaining(ticket, self.timer.now_ms()) else {
            return;
        };

        if remaining > 0.0 {
            self.timer.sleep(remaining.ceil() as u32).await;
        }
        if self.debouncer.borrow_mut().fire(ticket, self.timer.now_ms()) {
            self.save_snapshot().await;
        }
    }

    pub async fn save_snapshot(&self) {
        if let Err(e) = self.snapshots.save().await {
            log::error!("Error saving tabs and windows: {}", e);
        }
    }
}
