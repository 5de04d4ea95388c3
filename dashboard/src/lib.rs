pub mod coalescer;
pub mod config;
pub mod controller;
pub mod ingress;
pub mod series;
pub mod sink;
pub mod term;

pub use config::DashboardConfig;
pub use controller::{Controller, run_dashboard};
