//! Task Lists Frontend Entry Point

use leptos::prelude::*;
use log::LevelFilter;

use task_lists::app::App;
use task_lists::config::{AppConfig, APP_NAME};

fn main() {
    console_error_panic_hook::set_once();

    let config = AppConfig::from_env();
    let sink: rolling_logger::Sink = Box::new(|entry, app| {
        web_sys::console::log_1(&entry.format(app).into());
    });
    if rolling_logger::init_logger(APP_NAME, config.log_capacity, LevelFilter::Debug, Some(sink)).is_err() {
        web_sys::console::warn_1(&"[APP] Logger already installed".into());
    }

    mount_to_body(App);
}
