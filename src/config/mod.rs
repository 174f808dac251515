//! Configuration module for the fx-window dashboard.

// Can all be private because we have a public re-export.
mod api;
mod dashboard;
mod debug;
mod defaults;

// Re-export commonly used items
pub use api::{RATE_API, RateApiConfig};
pub use dashboard::{DASHBOARD, DashboardConfig, SlotLimits};
pub use debug::DF;
pub use defaults::{DEFAULTS, DefaultUnits};

pub const LOG_PERFORMANCE: bool = DF.log_performance;
