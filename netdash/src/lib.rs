//! netdash: terminal dashboard for a fleet-monitoring REST backend.

pub mod api;
pub mod app;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod mock;
pub mod notify;
pub mod profiles;
pub mod timer;
pub mod types;
pub mod ui;
pub mod view;
