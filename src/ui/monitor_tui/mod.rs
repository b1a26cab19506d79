//! Terminal User Interface for the monitor.
//!
//! A single ratatui screen that reads the sampler's state under its mask.

mod app;
mod event_handler;
mod render;
mod widgets;

pub use app::{run_monitor_app, MonitorApp, MonitorAppConfig};
pub use event_handler::MonitorEvent;
