// Domain types and value objects
mod date_window;
mod day_key;
mod rates;
mod unit_code;

// Re-export commonly used types to the world
pub use date_window::{DateWindow, key_of, range_label, range_label_for_input};
pub use day_key::DayKey;
pub use rates::{RateEntry, UnitCatalog};
pub use unit_code::{UnitCode, UnitCodeError};
