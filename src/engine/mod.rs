mod controller;
mod debounce;
mod view;

pub use controller::{CatalogState, DashboardController, TickReport};

pub use debounce::{DebouncedSelector, SelectOutcome};

pub use view::{CatalogStatus, DashboardView, RowCell, SlotRow, Sparkline, format_rate};
