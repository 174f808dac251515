#![allow(clippy::const_is_empty)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod ui;
pub mod utils;

// Re-export commonly used types outside of crate
pub use data::{CurrencyApi, DemoCurrencyApi, HttpCurrencyApi, WindowedRateCache};
pub use domain::{DateWindow, DayKey, UnitCode};
pub use engine::{DashboardController, DashboardView};
pub use models::SlotRegistry;

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Anchor date (YYYY-MM-DD). Defaults to yesterday.
    #[arg(long)]
    pub date: Option<String>,

    /// Main unit every rate is quoted against (e.g. gbp)
    #[arg(long)]
    pub main: Option<String>,

    /// Side unit for the next slot, repeatable (e.g. --side usd --side eur)
    #[arg(long)]
    pub side: Vec<String>,

    /// Override the rate API package root
    #[arg(long)]
    pub api_base: Option<String>,

    /// Use bundled demo rates instead of the network
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    /// Print a status line after each day arrives
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}
