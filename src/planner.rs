use std::collections::HashSet;

use chrono::{Days, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";
const REPORT_EXTENSION: &str = ".csv";

/// The dates in `[today - lookback_days, today)`, oldest first.
pub fn report_window(today: NaiveDate, lookback_days: u32) -> Vec<NaiveDate> {
    let Some(start) = today.checked_sub_days(Days::new(u64::from(lookback_days))) else {
        return vec![];
    };

    start.iter_days().take_while(|date| *date < today).collect()
}

pub fn report_key(prefix: &str, date: NaiveDate) -> String {
    format!("{}{}{}", prefix, date.format(DATE_FORMAT), REPORT_EXTENSION)
}

pub fn parse_report_key(prefix: &str, key: &str) -> Option<NaiveDate> {
    let date = key.strip_prefix(prefix)?.strip_suffix(REPORT_EXTENSION)?;
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Dates from `window` that have no report among `existing_keys`, in window order.
///
/// Keys that don't follow the report naming pattern are logged and ignored,
/// so a stray object in the bucket never blocks the export.
pub fn pending_dates<K: AsRef<str>>(
    window: &[NaiveDate],
    existing_keys: &[K],
    prefix: &str,
) -> Vec<NaiveDate> {
    let mut existing = HashSet::new();

    for key in existing_keys {
        let key = key.as_ref();
        match parse_report_key(prefix, key) {
            Some(date) => {
                existing.insert(date);
            }
            None => tracing::warn!("Skipping object with unexpected key: {}", key),
        }
    }

    window
        .iter()
        .filter(|date| !existing.contains(*date))
        .copied()
        .collect()
}
