/// UI module exports
mod components;
mod messaging;
pub mod popup;
pub mod settings;
