mod perf;
pub(crate) mod time_utils;

pub use time_utils::{
    AppInstant, DateInputError, TimeUtils, clamp_date, earliest_supported_date,
    format_date_for_input, min_date, parse_date_input, today_local, yesterday,
};
