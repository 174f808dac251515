use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::data::CurrencyApi;
use crate::domain::{DateWindow, DayKey, RateEntry, UnitCode};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Content address of one fetch: the day and the unit the rates are quoted against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub day: DayKey,
    pub base: UnitCode,
}

impl CacheKey {
    pub fn new(day: DayKey, base: UnitCode) -> Self {
        Self { day, base }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}@{}", self.base, self.day)
    }
}

/// Lifecycle of one cached fetch. `Resolved` and `Failed` are terminal.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    /// A fetch is in flight and no data has been seen for this key yet.
    Pending,
    Resolved(Arc<RateEntry>),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum EntryState {
    Pending,
    Resolved,
    Failed,
}

impl CacheEntry {
    pub fn state(&self) -> EntryState {
        match self {
            CacheEntry::Pending => EntryState::Pending,
            CacheEntry::Resolved(_) => EntryState::Resolved,
            CacheEntry::Failed(_) => EntryState::Failed,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, CacheEntry::Pending)
    }

    /// Fetching with nothing previously cached to show in the meantime.
    /// Settled entries never re-fetch, so this is every pending entry.
    pub fn is_initial_load(&self) -> bool {
        matches!(self, CacheEntry::Pending)
    }

    pub fn data(&self) -> Option<&Arc<RateEntry>> {
        match self {
            CacheEntry::Resolved(entry) => Some(entry),
            _ => None,
        }
    }
}

/// What one rate cell shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateCell {
    Rate(f64),
    Loading,
    /// Fetch failed, or the day resolved without a rate for this unit.
    Unavailable,
}

/// Query-ready snapshot of one window for one base unit.
#[derive(Debug, Clone)]
pub struct MergedView {
    pub base: UnitCode,
    pub days: Vec<DayKey>,
    /// Only days whose entry has resolved.
    pub rates_by_date: BTreeMap<DayKey, Arc<RateEntry>>,
    /// True while the day's entry is pending.
    pub loading_by_date: BTreeMap<DayKey, bool>,
    pub failed_days: BTreeSet<DayKey>,
    /// Some day is on its very first fetch.
    pub is_loading: bool,
    /// Some day is fetching, whether or not older data exists.
    pub is_fetching: bool,
}

impl MergedView {
    pub fn cell(&self, day: &DayKey, unit: &UnitCode) -> RateCell {
        if let Some(entry) = self.rates_by_date.get(day) {
            return entry.rate(unit).map_or(RateCell::Unavailable, RateCell::Rate);
        }
        if self.loading_by_date.get(day).copied().unwrap_or(false) {
            RateCell::Loading
        } else {
            RateCell::Unavailable
        }
    }

    pub fn rate(&self, day: &DayKey, unit: &UnitCode) -> Option<f64> {
        self.rates_by_date.get(day).and_then(|e| e.rate(unit))
    }

    /// One cell per window day, oldest first.
    pub fn series(&self, unit: &UnitCode) -> Vec<(DayKey, RateCell)> {
        self.days.iter().map(|d| (*d, self.cell(d, unit))).collect()
    }

    /// Every day has settled (resolved or failed).
    pub fn is_settled(&self) -> bool {
        !self.loading_by_date.values().any(|loading| *loading)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub fetches_issued: usize,
    pub by_state: BTreeMap<String, usize>,
}

struct FetchOutcome {
    key: CacheKey,
    result: Result<RateEntry, String>,
}

/// Per-(day, base) memoizing cache with request coalescing.
///
/// Each window day is fetched independently so overlapping windows reuse entries.
/// At most one fetch per key is ever outstanding: an unseen key becomes `Pending`
/// and spawns exactly one task; later requests for it attach to that entry.
/// Completions arrive on a channel and are applied by [`WindowedRateCache::poll`]
/// or [`WindowedRateCache::next_completion`], one at a time.
pub struct WindowedRateCache {
    api: Arc<dyn CurrencyApi>,
    runtime: Handle,
    entries: HashMap<CacheKey, CacheEntry>,
    result_tx: UnboundedSender<FetchOutcome>,
    result_rx: UnboundedReceiver<FetchOutcome>,
    fetches_issued: usize,
}

impl WindowedRateCache {
    pub fn new(api: Arc<dyn CurrencyApi>, runtime: Handle) -> Self {
        let (result_tx, result_rx) = unbounded_channel();
        Self {
            api,
            runtime,
            entries: HashMap::new(),
            result_tx,
            result_rx,
            fetches_issued: 0,
        }
    }

    /// Uses the runtime of the calling context. Panics outside a tokio runtime.
    pub fn on_current_runtime(api: Arc<dyn CurrencyApi>) -> Self {
        Self::new(api, Handle::current())
    }

    /// Makes sure every window day has an entry for `base`, then returns the merged view.
    /// Settled entries are served from memory. Pending ones are left alone.
    pub fn request(&mut self, window: &DateWindow, base: &UnitCode) -> MergedView {
        crate::trace_time!(&format!("Cache request [{}]", base), 500, {
            for day in window.days() {
                self.ensure(CacheKey::new(*day, base.clone()));
            }
        });
        self.view(window, base)
    }

    fn ensure(&mut self, key: CacheKey) {
        if let Some(_existing) = self.entries.get(&key) {
            #[cfg(debug_assertions)]
            if DF.log_cache {
                log::debug!("CACHE: {} -> {} (no fetch)", key, _existing.state());
            }
            return;
        }

        self.entries.insert(key.clone(), CacheEntry::Pending);
        self.spawn_fetch(key);
    }

    fn spawn_fetch(&mut self, key: CacheKey) {
        self.fetches_issued += 1;

        #[cfg(debug_assertions)]
        if DF.log_cache {
            log::info!("CACHE: fetching {} (#{})", key, self.fetches_issued);
        }

        let api = Arc::clone(&self.api);
        let tx = self.result_tx.clone();
        let (day, base) = (key.day, key.base.clone());
        let fetch = self.runtime.spawn(async move {
            api.fetch_rates(day, &base)
                .await
                .map_err(|e| format!("{:#}", e))
        });
        // A panicking provider still settles its entry.
        self.runtime.spawn(async move {
            let result = fetch
                .await
                .unwrap_or_else(|e| Err(format!("fetch task aborted: {}", e)));
            // Receiver only disappears with the cache itself.
            let _ = tx.send(FetchOutcome { key, result });
        });
    }

    fn apply(&mut self, outcome: FetchOutcome) -> CacheKey {
        let entry = match outcome.result {
            Ok(rates) => CacheEntry::Resolved(Arc::new(rates)),
            Err(reason) => {
                log::warn!("Rate fetch for {} failed: {}", outcome.key, reason);
                CacheEntry::Failed(reason)
            }
        };

        #[cfg(debug_assertions)]
        if DF.log_cache {
            log::info!("CACHE: {} settled as {}", outcome.key, entry.state());
        }

        self.entries.insert(outcome.key.clone(), entry);
        outcome.key
    }

    /// Applies every completion that has already arrived. Returns the keys that settled.
    pub fn poll(&mut self) -> Vec<CacheKey> {
        let mut settled = Vec::new();
        while let Ok(outcome) = self.result_rx.try_recv() {
            settled.push(self.apply(outcome));
        }
        settled
    }

    /// Waits for the next completion and applies it. `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<CacheKey> {
        if self.in_flight() == 0 {
            return None;
        }
        let outcome = self.result_rx.recv().await?;
        Some(self.apply(outcome))
    }

    /// Merged view of what is cached right now. Never starts a fetch.
    pub fn view(&self, window: &DateWindow, base: &UnitCode) -> MergedView {
        let mut view = MergedView {
            base: base.clone(),
            days: window.days().to_vec(),
            rates_by_date: BTreeMap::new(),
            loading_by_date: BTreeMap::new(),
            failed_days: BTreeSet::new(),
            is_loading: false,
            is_fetching: false,
        };

        for day in window.days() {
            let entry = self.entries.get(&CacheKey::new(*day, base.clone()));
            let fetching = entry.is_some_and(CacheEntry::is_fetching);

            match entry {
                Some(CacheEntry::Resolved(rates)) => {
                    view.rates_by_date.insert(*day, Arc::clone(rates));
                }
                Some(CacheEntry::Failed(_)) => {
                    view.failed_days.insert(*day);
                }
                _ => {}
            }

            view.loading_by_date.insert(*day, fetching);
            view.is_fetching |= fetching;
            view.is_loading |= entry.is_some_and(CacheEntry::is_initial_load);
        }

        view
    }

    pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn in_flight(&self) -> usize {
        self.entries.values().filter(|e| e.is_fetching()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut by_state: BTreeMap<String, usize> =
            EntryState::iter().map(|s| (s.to_string(), 0)).collect();
        for entry in self.entries.values() {
            *by_state.entry(entry.state().to_string()).or_default() += 1;
        }
        CacheStats {
            fetches_issued: self.fetches_issued,
            by_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DemoCurrencyApi;
    use chrono::NaiveDate;

    fn code(s: &str) -> UnitCode {
        UnitCode::new(s).unwrap()
    }

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn window(anchor: &str) -> DateWindow {
        DateWindow::expand(&NaiveDate::parse_from_str(anchor, "%Y-%m-%d").unwrap())
    }

    fn setup() -> (Arc<DemoCurrencyApi>, WindowedRateCache) {
        let api = Arc::new(DemoCurrencyApi::load().unwrap());
        let cache = WindowedRateCache::on_current_runtime(api.clone());
        (api, cache)
    }

    async fn drain(cache: &mut WindowedRateCache) {
        while cache.next_completion().await.is_some() {}
    }

    #[tokio::test]
    async fn concurrent_requests_coalesce() {
        let (api, mut cache) = setup();
        let gbp = code("gbp");
        let w = window("2025-11-22");

        let first = cache.request(&w, &gbp);
        let second = cache.request(&w, &gbp);
        assert!(first.is_loading && second.is_loading);
        assert_eq!(cache.stats().fetches_issued, 7);

        drain(&mut cache).await;
        assert_eq!(api.rate_call_count(), 7);
        for d in w.days() {
            assert_eq!(api.calls_for(*d, &gbp), 1);
        }
    }

    #[tokio::test]
    async fn resolved_entries_are_memoized() {
        let (api, mut cache) = setup();
        let gbp = code("gbp");
        let w = window("2025-11-22");

        cache.request(&w, &gbp);
        drain(&mut cache).await;
        let view = cache.request(&w, &gbp);

        assert!(!view.is_loading && !view.is_fetching);
        assert_eq!(view.rates_by_date.len(), 7);
        assert_eq!(cache.stats().fetches_issued, 7);
        assert_eq!(api.rate_call_count(), 7);
    }

    #[tokio::test]
    async fn sliding_window_only_fetches_new_day() {
        let (api, mut cache) = setup();
        let gbp = code("gbp");

        cache.request(&window("2025-11-22"), &gbp);
        drain(&mut cache).await;
        let view = cache.request(&window("2025-11-23"), &gbp);

        assert_eq!(cache.stats().fetches_issued, 8);
        assert_eq!(view.loading_by_date.values().filter(|l| **l).count(), 1);
        assert_eq!(view.loading_by_date.get(&day("2025-11-23")), Some(&true));

        drain(&mut cache).await;
        assert_eq!(api.calls_for(day("2025-11-22"), &gbp), 1);
        assert_eq!(api.rate_call_count(), 8);

        // Sliding back replays from memory.
        cache.request(&window("2025-11-22"), &gbp);
        assert_eq!(cache.stats().fetches_issued, 8);
    }

    #[tokio::test]
    async fn switching_base_keeps_old_entries() {
        let (_api, mut cache) = setup();
        let w = window("2025-11-22");

        cache.request(&w, &code("gbp"));
        cache.request(&w, &code("usd"));
        drain(&mut cache).await;
        assert_eq!(cache.len(), 14);

        let view = cache.request(&w, &code("gbp"));
        assert!(view.is_settled());
        assert_eq!(cache.stats().fetches_issued, 14);
    }

    #[tokio::test]
    async fn partial_results_render_progressively() {
        let (api, mut cache) = setup();
        let gbp = code("gbp");
        let anchor = day("2025-11-22");
        api.hold_everything();
        api.set_rates(anchor, &gbp, HashMap::from([(code("usd"), 1.2567)]));
        api.release(anchor);

        let w = window("2025-11-22");
        cache.request(&w, &gbp);
        assert_eq!(cache.next_completion().await, Some(CacheKey::new(anchor, gbp.clone())));

        let view = cache.view(&w, &gbp);
        assert_eq!(view.rate(&anchor, &code("usd")), Some(1.2567));
        assert_eq!(view.rates_by_date.len(), 1);
        for d in w.days().iter().filter(|d| **d != anchor) {
            assert_eq!(view.loading_by_date.get(d), Some(&true));
            assert!(!view.rates_by_date.contains_key(d));
        }
        assert!(view.is_loading && view.is_fetching);

        api.release_all();
        drain(&mut cache).await;
    }

    #[tokio::test]
    async fn failure_is_isolated_to_one_day() {
        let (api, mut cache) = setup();
        let gbp = code("gbp");
        let bad = day("2025-11-19");
        api.fail(bad, &gbp);

        let w = window("2025-11-22");
        cache.request(&w, &gbp);
        drain(&mut cache).await;
        let view = cache.request(&w, &gbp);

        assert_eq!(view.rates_by_date.len(), 6);
        assert!(view.failed_days.contains(&bad));
        assert_eq!(view.loading_by_date.get(&bad), Some(&false));
        assert_eq!(view.cell(&bad, &code("usd")), RateCell::Unavailable);
        assert!(matches!(view.cell(&day("2025-11-20"), &code("usd")), RateCell::Rate(_)));
        assert!(matches!(
            cache.entry(&CacheKey::new(bad, gbp.clone())),
            Some(CacheEntry::Failed(_))
        ));

        // Failed entries are terminal; no retry on re-request.
        assert_eq!(api.calls_for(bad, &gbp), 1);
        assert_eq!(cache.stats().fetches_issued, 7);
    }

    #[tokio::test]
    async fn missing_unit_is_unavailable_not_zero() {
        let (_api, mut cache) = setup();
        let w = window("2025-11-22");
        cache.request(&w, &code("gbp"));
        drain(&mut cache).await;

        let view = cache.view(&w, &code("gbp"));
        let last = w.last().unwrap();
        assert_eq!(view.cell(&last, &code("xxx")), RateCell::Unavailable);
        assert_eq!(view.cell(&last, &code("gbp")), RateCell::Rate(1.0));
    }

    #[tokio::test]
    async fn stats_count_states() {
        let (api, mut cache) = setup();
        let gbp = code("gbp");
        api.fail(day("2025-11-22"), &gbp);
        cache.request(&window("2025-11-22"), &gbp);
        assert_eq!(cache.stats().by_state.get("Pending"), Some(&7));

        drain(&mut cache).await;
        let stats = cache.stats();
        assert_eq!(stats.by_state.get("Resolved"), Some(&6));
        assert_eq!(stats.by_state.get("Failed"), Some(&1));
        assert_eq!(stats.by_state.get("Pending"), Some(&0));
        assert!(cache.poll().is_empty());
    }

    #[tokio::test]
    async fn held_day_stays_loading_while_others_settle() {
        let (api, mut cache) = setup();
        let gbp = code("gbp");
        let held = day("2025-11-19");
        api.hold(held);

        cache.request(&window("2025-11-22"), &gbp);
        for _ in 0..6 {
            assert!(cache.next_completion().await.is_some());
        }

        let view = cache.view(&window("2025-11-22"), &gbp);
        assert_eq!(view.cell(&held, &code("usd")), RateCell::Loading);
        assert_eq!(view.rates_by_date.len(), 6);
        assert!(view.is_loading);
        assert_eq!(cache.in_flight(), 1);

        api.release(held);
        drain(&mut cache).await;
        assert!(cache.view(&window("2025-11-22"), &gbp).is_settled());
        assert_eq!(api.calls_for(held, &gbp), 1);
    }

    struct PanickingApi;

    #[async_trait::async_trait]
    impl CurrencyApi for PanickingApi {
        async fn fetch_catalog(&self) -> anyhow::Result<crate::domain::UnitCatalog> {
            panic!("catalog provider crashed");
        }

        async fn fetch_rates(&self, _day: DayKey, _base: &UnitCode) -> anyhow::Result<RateEntry> {
            panic!("rate provider crashed");
        }
    }

    #[tokio::test]
    async fn panicking_provider_settles_as_failed() {
        let mut cache = WindowedRateCache::on_current_runtime(Arc::new(PanickingApi));
        let gbp = code("gbp");
        let w = window("2025-11-22");
        cache.request(&w, &gbp);

        drain(&mut cache).await;
        assert_eq!(cache.in_flight(), 0);
        let view = cache.view(&w, &gbp);
        assert_eq!(view.failed_days.len(), 7);
        assert!(!view.is_loading);
        assert_eq!(view.cell(&day("2025-11-22"), &code("usd")), RateCell::Unavailable);

        // Failed entries are terminal, so the crash is not retried.
        cache.request(&w, &gbp);
        assert_eq!(cache.stats().fetches_issued, 7);
    }
}
