use serde::Serialize;
use strum_macros::Display;

use crate::config::DASHBOARD;
use crate::data::{MergedView, RateCell};
use crate::domain::{DayKey, UnitCode};
use crate::models::SlotPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum CatalogStatus {
    Pending,
    Loaded,
    Failed,
}

/// Everything presentation needs for one frame. Rebuilt after every event.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub catalog_status: CatalogStatus,
    pub main_unit: Option<UnitCode>,
    pub main_label: Option<String>,
    /// Date input value (follows every keystroke).
    pub raw_date: String,
    /// Date the window is anchored on.
    pub settled_date: String,
    pub range_label: String,
    pub days: Vec<DayKey>,
    pub rows: Vec<SlotRow>,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub can_add_slot: bool,
}

impl DashboardView {
    /// Rows cannot show anything until both the catalog and a main unit exist.
    pub fn is_ready(&self) -> bool {
        self.catalog_status == CatalogStatus::Loaded && self.main_unit.is_some()
    }

    pub fn row(&self, position: SlotPosition) -> Option<&SlotRow> {
        self.rows.iter().find(|r| r.position == position)
    }
}

/// One side-unit row, in ascending position order within the view.
#[derive(Debug, Clone)]
pub struct SlotRow {
    pub position: SlotPosition,
    pub code: Option<UnitCode>,
    pub label: String,
    /// One cell per window day, oldest first. Empty rows hold `RowCell::Empty`.
    pub cells: Vec<RowCell>,
    /// Settled-day rate cell for the headline figure.
    pub current: RowCell,
    pub sparkline: Option<Sparkline>,
    pub can_remove: bool,
    /// Units selectable in this row (excludes the main unit and other rows' units).
    pub options: Vec<UnitCode>,
}

/// Cell as presented: a rate cell or "no unit chosen".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowCell {
    Rate(f64),
    Loading,
    Unavailable,
    Empty,
}

impl From<RateCell> for RowCell {
    fn from(cell: RateCell) -> Self {
        match cell {
            RateCell::Rate(r) => RowCell::Rate(r),
            RateCell::Loading => RowCell::Loading,
            RateCell::Unavailable => RowCell::Unavailable,
        }
    }
}

impl std::fmt::Display for RowCell {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RowCell::Rate(r) => write!(f, "{}", format_rate(*r)),
            RowCell::Loading => write!(f, "..."),
            RowCell::Unavailable => write!(f, "n/a"),
            RowCell::Empty => write!(f, ""),
        }
    }
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.*}", DASHBOARD.rate_decimal_places, rate)
}

/// Positive points of a row plus a padded y-domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Sparkline {
    pub points: Vec<(DayKey, f64)>,
    /// Index of each point within the full window.
    pub window_index: Vec<usize>,
    pub y_min: f64,
    pub y_max: f64,
}

impl Sparkline {
    /// `None` when no day has a positive rate yet.
    pub fn from_cells(days: &[DayKey], cells: &[RowCell]) -> Option<Self> {
        let (window_index, points): (Vec<usize>, Vec<(DayKey, f64)>) = days
            .iter()
            .zip(cells)
            .enumerate()
            .filter_map(|(i, (day, cell))| match cell {
                RowCell::Rate(r) if *r > 0.0 => Some((i, (*day, *r))),
                _ => None,
            })
            .unzip();

        if points.is_empty() {
            return None;
        }

        let min = points.iter().map(|(_, r)| *r).fold(f64::INFINITY, f64::min);
        let max = points.iter().map(|(_, r)| *r).fold(f64::NEG_INFINITY, f64::max);
        let mut padding = (max - min) * DASHBOARD.sparkline_padding_pct;
        if padding <= 0.0 {
            padding = DASHBOARD.sparkline_flat_padding;
        }

        Some(Self {
            points,
            window_index,
            y_min: min - padding,
            y_max: max + padding,
        })
    }

    /// Text sparkline, one glyph per window day (blank where there is no point).
    pub fn render(&self, window_len: usize) -> String {
        const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
        let span = self.y_max - self.y_min;
        let mut out = vec![' '; window_len];
        for (idx, (_, rate)) in self.window_index.iter().zip(&self.points) {
            let level = ((rate - self.y_min) / span * (BARS.len() - 1) as f64).round() as usize;
            if let Some(slot) = out.get_mut(*idx) {
                *slot = BARS[level.min(BARS.len() - 1)];
            }
        }
        out.into_iter().collect()
    }
}

pub(crate) fn row_cells(
    merged: Option<&MergedView>,
    days: &[DayKey],
    code: Option<&UnitCode>,
) -> Vec<RowCell> {
    match (merged, code) {
        (Some(view), Some(code)) => days.iter().map(|d| view.cell(d, code).into()).collect(),
        (None, Some(_)) => vec![RowCell::Loading; days.len()],
        (_, None) => vec![RowCell::Empty; days.len()],
    }
}
