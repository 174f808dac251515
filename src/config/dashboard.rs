//! Dashboard behaviour constants (slot bounds, debounce, display precision)
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds for the side-unit slot registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLimits {
    pub min: usize,
    pub max: usize,
}

impl Default for SlotLimits {
    fn default() -> Self {
        DASHBOARD.slots
    }
}

/// Date picker constraints
pub struct DateLimits {
    /// Earliest day the rate API is known to serve (YYYY-MM-DD)
    pub earliest_supported_date: &'static str,
    /// How far back the rolling lower bound reaches from today
    pub rolling_min_days: i64,
}

pub struct DashboardConfig {
    pub slots: SlotLimits,
    pub dates: DateLimits,
    /// Quiet period before a date selection is propagated
    pub debounce: Duration,
    /// Number of consecutive days in a window (anchor included)
    pub window_days: usize,
    pub rate_decimal_places: usize,
    /// Relative y-axis padding applied around sparkline min/max
    pub sparkline_padding_pct: f64,
    /// Padding used when every point in a sparkline is equal
    pub sparkline_flat_padding: f64,
}

pub const DASHBOARD: DashboardConfig = DashboardConfig {
    slots: SlotLimits { min: 3, max: 7 },
    dates: DateLimits {
        earliest_supported_date: "2024-04-01", // approximate start of published history
        rolling_min_days: 90,
    },
    debounce: Duration::from_millis(200),
    window_days: 7,
    rate_decimal_places: 4,
    sparkline_padding_pct: 0.1,
    sparkline_flat_padding: 0.01,
};
