/// Tab Grouper - Chrome Extension that sorts tabs into category groups
/// Built with Rust + WASM + Yew

pub mod commands;
pub mod config;
pub mod debounce;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod matcher;
pub mod pattern;
pub mod reconciler;
pub mod router;
pub mod rules;
pub mod settings;
pub mod snapshot;
pub mod store;

mod chrome;
pub mod ui;

#[cfg(test)]
mod testing;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Wire the service worker to the grouping engine
#[wasm_bindgen]
pub fn start_background() {
    spawn_local(chrome::run_background());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the settings page
#[wasm_bindgen]
pub fn start_settings() {
    yew::Renderer::<ui::settings::SettingsPage>::new().render();
}

