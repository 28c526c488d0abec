//! Detail table rows for a twin's state snapshot.

use chrono::{Local, TimeZone};

use super::pattern::PatternFilter;
use crate::api::{HdtStatus, PropertyRecord, TIMESTAMP_FIELD};

/// Placeholder for a missing cell.
pub const MISSING: &str = "—";

/// One rendered row of the detail table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRow {
    pub key: String,
    pub value: String,
    pub timestamp: String,
}

impl StatusRow {
    pub fn from_record(record: &PropertyRecord) -> Self {
        let value = record
            .value_map()
            .iter()
            .filter(|(k, _)| *k != TIMESTAMP_FIELD)
            .map(|(k, v)| format!("{}: {}", k, v.value))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            key: record.key.clone(),
            value: if value.is_empty() {
                MISSING.to_string()
            } else {
                value
            },
            timestamp: record
                .timestamp()
                .and_then(format_timestamp)
                .unwrap_or_else(|| MISSING.to_string()),
        }
    }
}

/// Rows of the snapshot whose key matches the search text.
pub fn rows(status: &HdtStatus, search: &str) -> Vec<StatusRow> {
    let filter = PatternFilter::new(search);
    filter
        .apply(&status.properties, |p| p.key.as_str())
        .into_iter()
        .map(StatusRow::from_record)
        .collect()
}

/// Format an epoch-millisecond timestamp as local date and time.
pub fn format_timestamp(ms: f64) -> Option<String> {
    if !ms.is_finite() {
        return None;
    }
    Local
        .timestamp_millis_opt(ms as i64)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Format an epoch-millisecond timestamp as local time of day, for chart axes.
pub fn format_time_of_day(ms: f64) -> String {
    if !ms.is_finite() {
        return String::new();
    }
    Local
        .timestamp_millis_opt(ms as i64)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FieldValue, ValueMap};

    fn record(key: &str, fields: Vec<(&str, FieldValue)>) -> PropertyRecord {
        PropertyRecord::new(key, fields.into_iter().collect::<ValueMap>())
    }

    fn status() -> HdtStatus {
        HdtStatus {
            properties: vec![
                record(
                    "heart-rate",
                    vec![
                        ("timestamp", FieldValue::number(1_700_000_000_000.0)),
                        ("bpm", FieldValue::number(72.0)),
                    ],
                ),
                record(
                    "blood-pressure",
                    vec![
                        ("systolic", FieldValue::number(120.0)),
                        ("diastolic", FieldValue::number(80.0)),
                    ],
                ),
                record("empty", vec![]),
            ],
        }
    }

    #[test]
    fn value_column_skips_timestamp() {
        let rows = rows(&status(), "");
        assert_eq!(rows[0].value, "bpm: 72");
        assert_eq!(rows[1].value, "systolic: 120, diastolic: 80");
        assert_eq!(rows[2].value, MISSING);
    }

    #[test]
    fn timestamp_column_falls_back_to_placeholder() {
        let rows = rows(&status(), "");
        assert_ne!(rows[0].timestamp, MISSING);
        assert_eq!(rows[1].timestamp, MISSING);
    }

    #[test]
    fn rows_are_filtered_by_key() {
        let rows = rows(&status(), "PRESS");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "blood-pressure");
    }

    #[test]
    fn invalid_search_shows_everything() {
        assert_eq!(rows(&status(), "heart[").len(), 3);
    }

    #[test]
    fn non_finite_timestamps_are_not_formatted() {
        assert!(format_timestamp(f64::NAN).is_none());
        assert_eq!(format_time_of_day(f64::INFINITY), "");
    }
}
