use tabled::builder::Builder;
use tabled::settings::Style;

use crate::engine::{CatalogStatus, DashboardView, RowCell, SlotRow};

/// Header line above the table: main unit, window range and fetch status.
pub fn render_status_line(view: &DashboardView) -> String {
    let main = view.main_label.as_deref().unwrap_or("(no main unit)");
    let status = match view.catalog_status {
        CatalogStatus::Pending => "loading units...",
        CatalogStatus::Failed => "unit list unavailable",
        CatalogStatus::Loaded if view.is_loading => "loading rates...",
        CatalogStatus::Loaded if view.is_fetching => "refreshing...",
        CatalogStatus::Loaded => "up to date",
    };

    let mut line = format!("{} | {} | {}", main, view.range_label, status);
    if view.raw_date != view.settled_date {
        line.push_str(&format!(" | pending date {}", view.raw_date));
    }
    line
}

/// One row per slot: headline rate for the settled day, every window day, and a trend glyph strip.
pub fn render_dashboard(view: &DashboardView) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["#".to_string(), "Unit".to_string(), "Rate".to_string()];
    header.extend(view.days.iter().map(|d| format!("{:02}-{:02}", d.month(), d.day())));
    header.push("Trend".to_string());
    builder.push_record(header);

    for row in &view.rows {
        builder.push_record(row_record(row, view.days.len()));
    }

    let mut table = builder.build();
    table.with(Style::rounded());

    format!("{}\n{}", render_status_line(view), table)
}

fn row_record(row: &SlotRow, window_len: usize) -> Vec<String> {
    let mut record = vec![
        if row.can_remove {
            format!("{}*", row.position)
        } else {
            row.position.to_string()
        },
        row.label.clone(),
        headline(row.current),
    ];
    record.extend(row.cells.iter().map(|c| c.to_string()));
    record.push(
        row.sparkline
            .as_ref()
            .map(|s| s.render(window_len))
            .unwrap_or_default(),
    );
    record
}

fn headline(cell: RowCell) -> String {
    match cell {
        RowCell::Empty => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateWindow, UnitCode};
    use crate::engine::Sparkline;
    use chrono::NaiveDate;

    fn view() -> DashboardView {
        let window = DateWindow::expand(&NaiveDate::from_ymd_opt(2025, 11, 22).unwrap());
        let days = window.days().to_vec();
        let mut cells = vec![RowCell::Loading; 6];
        cells.push(RowCell::Rate(1.2567));
        let sparkline = Sparkline::from_cells(&days, &cells);

        DashboardView {
            catalog_status: CatalogStatus::Loaded,
            main_unit: Some(UnitCode::new("gbp").unwrap()),
            main_label: Some("GBP (British Pound)".to_string()),
            raw_date: "2025-11-22".to_string(),
            settled_date: "2025-11-22".to_string(),
            range_label: window.range_label(),
            days,
            rows: vec![
                SlotRow {
                    position: 1,
                    code: Some(UnitCode::new("usd").unwrap()),
                    label: "USD (US Dollar)".to_string(),
                    cells,
                    current: RowCell::Rate(1.2567),
                    sparkline,
                    can_remove: false,
                    options: Vec::new(),
                },
                SlotRow {
                    position: 2,
                    code: None,
                    label: "Select a unit".to_string(),
                    cells: vec![RowCell::Empty; 7],
                    current: RowCell::Empty,
                    sparkline: None,
                    can_remove: true,
                    options: Vec::new(),
                },
            ],
            is_loading: true,
            is_fetching: true,
            can_add_slot: true,
        }
    }

    #[test]
    fn table_lists_days_and_rates() {
        let out = render_dashboard(&view());
        assert!(out.starts_with(
            "GBP (British Pound) | 2025-11-16 to 2025-11-22 | loading rates..."
        ));
        assert!(out.contains("11-16"));
        assert!(out.contains("11-22"));
        assert!(out.contains("1.2567"));
        assert!(out.contains("2*"));
    }

    #[test]
    fn status_line_shows_pending_date() {
        let mut v = view();
        v.raw_date = "2025-10-01".to_string();
        v.is_loading = false;
        v.is_fetching = false;
        assert_eq!(
            render_status_line(&v),
            "GBP (British Pound) | 2025-11-16 to 2025-11-22 | up to date | pending date 2025-10-01"
        );
    }
}
