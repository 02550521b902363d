/// Popup and settings pages talk to the background through runtime messages
use wasm_bindgen::prelude::*;

use crate::commands::{Command, CommandResponse};

#[wasm_bindgen(module = "/messaging.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn openSettingsPage() -> Result<(), JsValue>;
}

pub async fn send_command(command: &Command) -> Result<CommandResponse, String> {
    let message = serde_wasm_bindgen::to_value(command).map_err(|e| format!("Failed to serialize: {:?}", e))?;

    let reply = sendMessage(message)
        .await
        .map_err(|e| format!("Background did not answer: {:?}", e))?;

    serde_wasm_bindgen::from_value(reply).map_err(|e| format!("Failed to parse response: {:?}", e))
}

pub async fn open_settings() {
    if let Err(e) = openSettingsPage().await {
        log::error!("Failed to open settings: {:?}", e);
    }
}
