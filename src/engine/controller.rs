use std::sync::Arc;

use chrono::NaiveDate;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::config::{DASHBOARD, DEFAULTS, DefaultUnits};
use crate::data::{CacheKey, CurrencyApi, MergedView, WindowedRateCache};
use crate::domain::{DateWindow, UnitCatalog, UnitCode, UnitCodeError};
use crate::models::{SlotPosition, SlotRegistry};
use crate::utils::{AppInstant, earliest_supported_date, format_date_for_input, yesterday};

use super::debounce::{DebouncedSelector, SelectOutcome};
use super::view::{CatalogStatus, DashboardView, RowCell, SlotRow, Sparkline, row_cells};

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone)]
pub enum CatalogState {
    Pending,
    Loaded(Arc<UnitCatalog>),
    Failed(String),
}

impl CatalogState {
    pub fn status(&self) -> CatalogStatus {
        match self {
            CatalogState::Pending => CatalogStatus::Pending,
            CatalogState::Loaded(_) => CatalogStatus::Loaded,
            CatalogState::Failed(_) => CatalogStatus::Failed,
        }
    }

    pub fn catalog(&self) -> Option<&Arc<UnitCatalog>> {
        match self {
            CatalogState::Loaded(c) => Some(c),
            _ => None,
        }
    }
}

/// What changed during one [`DashboardController::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub catalog_loaded: bool,
    pub date_settled: Option<NaiveDate>,
    pub settled_keys: Vec<CacheKey>,
}

impl TickReport {
    pub fn changed(&self) -> bool {
        self.catalog_loaded || self.date_settled.is_some() || !self.settled_keys.is_empty()
    }
}

/// Single state surface for presentation.
///
/// Owns the main unit and the debounced date, delegates side units to the
/// [`SlotRegistry`], and feeds `(window, main unit)` to the [`WindowedRateCache`]
/// whenever either changes.
pub struct DashboardController {
    api: Arc<dyn CurrencyApi>,
    runtime: Handle,
    main_unit: Option<UnitCode>,
    slots: SlotRegistry,
    selector: DebouncedSelector,
    window: DateWindow,
    cache: WindowedRateCache,
    catalog: CatalogState,
    catalog_rx: Option<oneshot::Receiver<Result<UnitCatalog, String>>>,
    defaults: &'static DefaultUnits,
    defaults_applied: bool,
}

impl DashboardController {
    /// Date starts settled on yesterday; nothing is fetched until a main unit exists.
    pub fn new(api: Arc<dyn CurrencyApi>, runtime: Handle, today: NaiveDate) -> Self {
        let max = yesterday(today);
        let selector = DebouncedSelector::new(max, earliest_supported_date(), max);
        let window = DateWindow::expand(&selector.settled());
        let cache = WindowedRateCache::new(Arc::clone(&api), runtime.clone());

        Self {
            api,
            runtime,
            main_unit: None,
            slots: SlotRegistry::new(DASHBOARD.slots),
            selector,
            window,
            cache,
            catalog: CatalogState::Pending,
            catalog_rx: None,
            defaults: &DEFAULTS,
            defaults_applied: false,
        }
    }

    pub fn on_current_runtime(api: Arc<dyn CurrencyApi>, today: NaiveDate) -> Self {
        Self::new(api, Handle::current(), today)
    }

    // --- Accessors ---

    pub fn main_unit(&self) -> Option<&UnitCode> {
        self.main_unit.as_ref()
    }

    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    pub fn selector(&self) -> &DebouncedSelector {
        &self.selector
    }

    pub fn window(&self) -> &DateWindow {
        &self.window
    }

    pub fn cache(&self) -> &WindowedRateCache {
        &self.cache
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn defaults_applied(&self) -> bool {
        self.defaults_applied
    }

    // --- Catalog ---

    /// Starts the one catalog fetch for this session. Later calls are no-ops.
    pub fn start_catalog_load(&mut self) {
        if self.catalog_rx.is_some() || !matches!(self.catalog, CatalogState::Pending) {
            return;
        }

        let (tx, rx) = oneshot::channel();
        let api = Arc::clone(&self.api);
        self.runtime.spawn(async move {
            let result = api.fetch_catalog().await.map_err(|e| format!("{:#}", e));
            let _ = tx.send(result);
        });
        self.catalog_rx = Some(rx);
    }

    /// Waits for the catalog fetch started by [`Self::start_catalog_load`], then applies it.
    pub async fn wait_for_catalog(&mut self) -> &CatalogState {
        if let Some(rx) = self.catalog_rx.take() {
            let result = rx
                .await
                .unwrap_or_else(|_| Err("catalog task dropped".to_string()));
            self.on_catalog_result(result);
        }
        &self.catalog
    }

    fn poll_catalog(&mut self) -> bool {
        let Some(rx) = self.catalog_rx.as_mut() else {
            return false;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => Err("catalog task dropped".to_string()),
        };
        self.catalog_rx = None;
        self.on_catalog_result(result);
        true
    }

    fn on_catalog_result(&mut self, result: Result<UnitCatalog, String>) {
        match result {
            Ok(catalog) => self.on_catalog_loaded(catalog),
            Err(reason) => {
                log::error!("Failed to load unit catalog: {}", reason);
                self.catalog = CatalogState::Failed(reason);
            }
        }
    }

    /// Stores the catalog and applies configured defaults if nothing has been chosen yet.
    pub fn on_catalog_loaded(&mut self, catalog: UnitCatalog) {
        #[cfg(debug_assertions)]
        log::info!("Unit catalog loaded: {} units", catalog.len());

        self.catalog = CatalogState::Loaded(Arc::new(catalog));
        self.apply_defaults();
    }

    /// Fills an unset main unit and an unassigned slot registry from the configured
    /// defaults. Runs at most once per session, and only with a non-empty catalog.
    pub fn apply_defaults(&mut self) -> bool {
        if self.defaults_applied {
            return false;
        }
        let has_units = self.catalog.catalog().is_some_and(|c| !c.is_empty());
        if !has_units {
            return false;
        }

        if self.main_unit.is_none() {
            self.main_unit = UnitCode::new(self.defaults.main_unit).ok();
        }
        if self.slots.is_unassigned() {
            self.slots.apply_defaults(self.defaults);
        }
        self.defaults_applied = true;

        #[cfg(debug_assertions)]
        if DF.log_slots {
            log::info!(
                "Defaults applied: main={:?} slots={:?}",
                self.main_unit,
                self.slots.assigned_codes()
            );
        }

        self.refresh();
        true
    }

    // --- Units ---

    pub fn set_main_unit(&mut self, raw: &str) -> Result<(), UnitCodeError> {
        let code = UnitCode::new(raw)?;
        if self.main_unit.as_ref() != Some(&code) {
            self.main_unit = Some(code);
            self.refresh();
        }
        Ok(())
    }

    /// Assigns a unit to an existing slot; a blank string clears it.
    pub fn set_side_unit(&mut self, position: SlotPosition, raw: &str) -> bool {
        self.slots.set_slot(position, UnitCode::new(raw).ok())
    }

    pub fn add_slot(&mut self) -> Option<SlotPosition> {
        self.slots.add_slot()
    }

    pub fn remove_slot(&mut self, position: SlotPosition) -> bool {
        self.slots.remove_slot(position)
    }

    /// Units selectable in `position`: catalog units minus the main unit and
    /// units held by other slots (the slot's own unit stays selectable).
    pub fn options_for(&self, position: SlotPosition) -> Vec<UnitCode> {
        let Some(catalog) = self.catalog.catalog() else {
            return Vec::new();
        };
        let own = self.slots.code(position);
        let taken: Vec<UnitCode> = self
            .slots
            .slots()
            .into_iter()
            .filter(|s| s.position != position)
            .filter_map(|s| s.code)
            .collect();

        catalog
            .codes()
            .filter(|c| Some(*c) != self.main_unit.as_ref())
            .filter(|c| Some(*c) == own || !taken.contains(*c))
            .cloned()
            .collect()
    }

    // --- Dates ---

    pub fn select_date(&mut self, input: &str, now: AppInstant) -> SelectOutcome {
        self.selector.select_input(input, now)
    }

    pub fn select_naive_date(&mut self, date: NaiveDate, now: AppInstant) -> SelectOutcome {
        self.selector.select(date, now)
    }

    /// Moves the "yesterday" bound when the calendar day rolls over.
    pub fn set_today(&mut self, today: NaiveDate) {
        let before = self.selector.settled();
        self.selector.set_bounds(earliest_supported_date(), yesterday(today));
        if self.selector.settled() != before {
            self.window = DateWindow::expand(&self.selector.settled());
            self.refresh();
        }
    }

    // --- Event loop ---

    /// Requests the current window for the current main unit.
    pub fn refresh(&mut self) -> Option<MergedView> {
        let main = self.main_unit.as_ref()?;
        Some(self.cache.request(&self.window, main))
    }

    /// Processes everything that is due at `now`: catalog arrival, the debounce
    /// timer and any fetch completions.
    pub fn tick(&mut self, now: AppInstant) -> TickReport {
        let mut report = TickReport {
            catalog_loaded: self.poll_catalog(),
            ..TickReport::default()
        };

        if let Some(settled) = self.selector.poll(now) {
            self.window = DateWindow::expand(&settled);
            self.refresh();
            report.date_settled = Some(settled);
        }

        report.settled_keys = self.cache.poll();
        report
    }

    /// Waits for one fetch completion. `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<CacheKey> {
        self.cache.next_completion().await
    }

    pub fn merged(&self) -> Option<MergedView> {
        let main = self.main_unit.as_ref()?;
        Some(self.cache.view(&self.window, main))
    }

    /// Snapshot for presentation.
    pub fn view(&self) -> DashboardView {
        let merged = self.merged();
        let days = self.window.days().to_vec();
        let catalog = self.catalog.catalog();
        let anchor = self.window.last();

        let rows = self
            .slots
            .slots()
            .into_iter()
            .map(|slot| {
                let cells = if catalog.is_some() {
                    row_cells(merged.as_ref(), &days, slot.code.as_ref())
                } else {
                    vec![RowCell::Loading; days.len()]
                };
                let current = anchor
                    .and_then(|a| days.iter().position(|d| *d == a))
                    .and_then(|i| cells.get(i).copied())
                    .unwrap_or(RowCell::Empty);
                let label = match (&slot.code, catalog) {
                    (Some(code), Some(c)) => c.label(code),
                    (Some(code), None) => code.display_label(),
                    (None, _) => "Select a unit".to_string(),
                };

                SlotRow {
                    position: slot.position,
                    sparkline: Sparkline::from_cells(&days, &cells),
                    can_remove: self.slots.can_remove(slot.position),
                    options: self.options_for(slot.position),
                    code: slot.code,
                    label,
                    cells,
                    current,
                }
            })
            .collect();

        DashboardView {
            catalog_status: self.catalog.status(),
            main_label: match (&self.main_unit, catalog) {
                (Some(code), Some(c)) => Some(c.label(code)),
                (Some(code), None) => Some(code.display_label()),
                (None, _) => None,
            },
            main_unit: self.main_unit.clone(),
            raw_date: format_date_for_input(Some(self.selector.raw())),
            settled_date: format_date_for_input(Some(self.selector.settled())),
            range_label: self.window.range_label(),
            days,
            rows,
            is_loading: merged.as_ref().is_some_and(|m| m.is_loading),
            is_fetching: merged.as_ref().is_some_and(|m| m.is_fetching),
            can_add_slot: self.slots.can_add(),
        }
    }
}
