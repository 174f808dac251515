use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;
use tokio::sync::Notify;

use crate::data::CurrencyApi;
use crate::domain::{DayKey, RateEntry, UnitCatalog, UnitCode};

// Embedded offline rate table
const DEMO_RATES_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/demo_data/demo_rates.json"
));

#[derive(Deserialize)]
struct DemoFile {
    catalog: HashMap<String, String>,
    per_usd: HashMap<String, f64>,
}

enum Gate {
    Open,
    HoldDays(HashSet<DayKey>),
    HoldAllExcept(HashSet<DayKey>),
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Offline stand-in for the rate service.
///
/// Rates are derived from an embedded "units per USD" table with a small
/// deterministic day-to-day drift. Individual (day, base) responses can be
/// overridden, failed, or held back until released, and every call is recorded.
pub struct DemoCurrencyApi {
    catalog: UnitCatalog,
    per_usd: HashMap<UnitCode, f64>,
    overrides: Mutex<HashMap<(DayKey, UnitCode), HashMap<UnitCode, f64>>>,
    failing: Mutex<HashSet<(DayKey, UnitCode)>>,
    catalog_down: Mutex<bool>,
    gate: Mutex<Gate>,
    released: Notify,
    rate_calls: Mutex<Vec<(DayKey, UnitCode)>>,
    catalog_calls: Mutex<usize>,
}

impl DemoCurrencyApi {
    pub fn load() -> Result<Self> {
        #[cfg(debug_assertions)]
        log::info!("Loading embedded demo rate table...");

        let file: DemoFile =
            serde_json::from_str(DEMO_RATES_JSON).context("Failed to parse embedded demo rates")?;

        let catalog = UnitCatalog::new(
            file.catalog
                .into_iter()
                .filter_map(|(code, name)| Some((UnitCode::new(&code).ok()?, name)))
                .collect(),
        );
        let per_usd = file
            .per_usd
            .into_iter()
            .filter_map(|(code, rate)| Some((UnitCode::new(&code).ok()?, rate)))
            .collect();

        Ok(Self::from_parts(catalog, per_usd))
    }

    /// Empty catalog, no generated rates: every response must come from `set_rates`.
    pub fn empty() -> Self {
        Self::from_parts(UnitCatalog::default(), HashMap::new())
    }

    fn from_parts(catalog: UnitCatalog, per_usd: HashMap<UnitCode, f64>) -> Self {
        Self {
            catalog,
            per_usd,
            overrides: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            catalog_down: Mutex::new(false),
            gate: Mutex::new(Gate::Open),
            released: Notify::new(),
            rate_calls: Mutex::new(Vec::new()),
            catalog_calls: Mutex::new(0),
        }
    }

    pub fn with_catalog(mut self, catalog: UnitCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Fixed response for one (day, base) pair.
    pub fn set_rates(&self, day: DayKey, base: &UnitCode, rates: HashMap<UnitCode, f64>) {
        lock(&self.overrides).insert((day, base.clone()), rates);
    }

    pub fn fail(&self, day: DayKey, base: &UnitCode) {
        lock(&self.failing).insert((day, base.clone()));
    }

    /// Every catalog request fails from now on.
    pub fn fail_catalog(&self) {
        *lock(&self.catalog_down) = true;
    }

    /// Responses for `day` wait until [`DemoCurrencyApi::release`] is called.
    pub fn hold(&self, day: DayKey) {
        match &mut *lock(&self.gate) {
            gate @ Gate::Open => *gate = Gate::HoldDays(HashSet::from([day])),
            Gate::HoldDays(days) => {
                days.insert(day);
            }
            Gate::HoldAllExcept(released) => {
                released.remove(&day);
            }
        }
    }

    /// Every response waits until its day is released.
    pub fn hold_everything(&self) {
        *lock(&self.gate) = Gate::HoldAllExcept(HashSet::new());
    }

    pub fn release(&self, day: DayKey) {
        match &mut *lock(&self.gate) {
            Gate::Open => {}
            Gate::HoldDays(days) => {
                days.remove(&day);
            }
            Gate::HoldAllExcept(released) => {
                released.insert(day);
            }
        }
        self.released.notify_waiters();
    }

    pub fn release_all(&self) {
        *lock(&self.gate) = Gate::Open;
        self.released.notify_waiters();
    }

    fn is_held(&self, day: DayKey) -> bool {
        match &*lock(&self.gate) {
            Gate::Open => false,
            Gate::HoldDays(days) => days.contains(&day),
            Gate::HoldAllExcept(released) => !released.contains(&day),
        }
    }

    pub fn rate_call_count(&self) -> usize {
        lock(&self.rate_calls).len()
    }

    pub fn calls_for(&self, day: DayKey, base: &UnitCode) -> usize {
        lock(&self.rate_calls)
            .iter()
            .filter(|(d, b)| *d == day && b == base)
            .count()
    }

    pub fn catalog_call_count(&self) -> usize {
        *lock(&self.catalog_calls)
    }

    fn generated_rates(&self, day: DayKey, base: &UnitCode) -> Option<HashMap<UnitCode, f64>> {
        let base_per_usd = *self.per_usd.get(base)?;
        // +-0.3% drift cycling weekly
        let drift = 1.0 + (f64::from(day.date().num_days_from_ce().rem_euclid(7)) - 3.0) * 0.001;

        Some(
            self.per_usd
                .iter()
                .map(|(unit, per_usd)| {
                    let rate = if unit == base {
                        1.0
                    } else {
                        per_usd / base_per_usd * drift
                    };
                    (unit.clone(), rate)
                })
                .collect(),
        )
    }
}

#[async_trait]
impl CurrencyApi for DemoCurrencyApi {
    async fn fetch_catalog(&self) -> Result<UnitCatalog> {
        *lock(&self.catalog_calls) += 1;
        if *lock(&self.catalog_down) {
            return Err(anyhow!("demo unit catalog unavailable"));
        }
        Ok(self.catalog.clone())
    }

    async fn fetch_rates(&self, day: DayKey, base: &UnitCode) -> Result<RateEntry> {
        lock(&self.rate_calls).push((day, base.clone()));

        loop {
            let notified = self.released.notified();
            if !self.is_held(day) {
                break;
            }
            notified.await;
        }

        if lock(&self.failing).contains(&(day, base.clone())) {
            return Err(anyhow!("demo failure for {} on {}", base, day));
        }

        let rates = lock(&self.overrides)
            .get(&(day, base.clone()))
            .cloned()
            .or_else(|| self.generated_rates(day, base))
            .ok_or_else(|| anyhow!("no demo rates for {} on {}", base, day))?;

        Ok(RateEntry::new(day, base.clone(), rates))
    }
}
