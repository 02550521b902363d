/// Request/response commands sent by the popup and settings pages
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::{GroupQuery, KeyValueStore, TabHost, TabId, TabQuery, Timer};
use crate::router::Router;
use crate::rules::RuleRecord;
use crate::settings::check_records;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    GroupTabs,
    SaveTabs,
    RestoreTabs,
    GetGroupConfigs,
    SaveGroupConfigs {
        #[serde(rename = "groupConfigs")]
        group_configs: Vec<RuleRecord>,
    },
    DeleteGroup {
        name: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_configs: Option<Vec<RuleRecord>>,
}

impl CommandResponse {
    pub fn ok(status: impl Into<String>) -> CommandResponse {
        CommandResponse {
            status: status.into(),
            ..CommandResponse::default()
        }
    }

    pub fn failed(status: impl Into<String>, error: impl ToString) -> CommandResponse {
        CommandResponse {
            status: status.into(),
            error: Some(error.to_string()),
            ..CommandResponse::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<H: TabHost, S: KeyValueStore, T: Timer> Router<H, S, T> {
    pub async fn execute(&self, command: Command) -> CommandResponse {
        log::debug!("Executing {:?}", command);

        match command {
            Command::GroupTabs => match self.dispatcher.place_current_window().await {
                Ok(_) => CommandResponse::ok("Tabs grouped by categories"),
                Err(e) => CommandResponse::failed("Error grouping tabs", e),
            },
            Command::SaveTabs => match self.snapshots.save().await {
                Ok(_) => CommandResponse::ok("Tabs saved successfully"),
                Err(e) => CommandResponse::failed("Error saving tabs", e),
            },
            Command::RestoreTabs => match self.snapshots.restore().await {
                Ok(0) => CommandResponse::ok("No saved tabs to restore"),
                Ok(_) => CommandResponse::ok("Tabs restored successfully"),
                Err(e) => CommandResponse::failed("Error restoring tabs", e),
            },
            Command::GetGroupConfigs => CommandResponse {
                group_configs: Some(self.rules.records()),
                ..CommandResponse::ok("success")
            },
            Command::SaveGroupConfigs { group_configs } => {
                if let Err(e) = check_records(&group_configs) {
                    log::warn!("Rejected group configs: {}", e);
                    return CommandResponse::failed("error", e);
                }

                let fallback = self.rules.fallback().to_string();
                let records: Vec<RuleRecord> =
                    group_configs.into_iter().filter(|r| r.name != fallback).collect();

                self.rules.replace_all(records);
                match self.rules.save().await {
                    Ok(()) => CommandResponse::ok("success"),
                    Err(e) => CommandResponse::failed("error", e),
                }
            }
            Command::DeleteGroup { name } => {
                self.rules.remove_rule(&name);
                self.rules.persist().await;

                match self.close_group_tabs(&name).await {
                    Ok(closed) => {
                        log::info!("Deleted group {:?}, closed {} tabs", name, closed);
                        CommandResponse::ok("success")
                    }
                    Err(e) => CommandResponse::failed("error", e),
                }
            }
        }
    }

    /// Close every tab sitting in a group titled `name`
    async fn close_group_tabs(&self, name: &str) -> Result<usize> {
        if !self.host.supports_groups() {
            return Ok(0);
        }

        let mut tab_ids: Vec<TabId> = Vec::new();
        for group in self.host.query_groups(&GroupQuery::titled(name)).await? {
            let tabs = self.host.query_tabs(&TabQuery::in_group(group.id)).await?;
            tab_ids.extend(tabs.iter().map(|tab| tab.id));
        }

        if !tab_ids.is_empty() {
            self.host.remove_tabs(&tab_ids).await?;
        }
        Ok(tab_ids.len())
    }
}
