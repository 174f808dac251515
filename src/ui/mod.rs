mod table;

pub use table::{render_dashboard, render_status_line};
