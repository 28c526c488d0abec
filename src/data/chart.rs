//! Live chart data derivation.
//!
//! Turns the sample history of one (twin, property) pair into the points and
//! series keys plotted by the live chart.

use crate::api::{PropertyRecord, TIMESTAMP_FIELD};

/// Default trailing window, in minutes.
pub const DEFAULT_WINDOW_MINUTES: u32 = 5;

/// Message shown instead of a chart when there is nothing to plot.
pub const EMPTY_MESSAGE: &str = "No data to display";

const MS_PER_MINUTE: i64 = 60 * 1000;

/// Fixed series for property types with a known shape.
const KNOWN_SERIES: &[(&str, &[&str])] = &[
    ("blood-pressure", &["systolic", "diastolic"]),
    ("heart-rate", &["bpm"]),
    ("mood", &["moodScore"]),
];

/// The numeric fields of one sample, in field order.
///
/// `timestamp` is included since it is itself numeric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartPoint {
    pub values: Vec<(String, f64)>,
}

impl ChartPoint {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn timestamp(&self) -> Option<f64> {
        self.get(TIMESTAMP_FIELD)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(k, _)| k.as_str())
    }
}

/// Everything the chart needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub points: Vec<ChartPoint>,
    pub keys: Vec<String>,
}

impl ChartData {
    /// Derive chart data, or `None` when there are no samples in the window
    /// or no series to plot.
    pub fn derive(
        history: &[PropertyRecord],
        property_type: &str,
        minutes: u32,
        now_ms: i64,
    ) -> Option<Self> {
        let points: Vec<ChartPoint> =
            window(history, minutes, now_ms).into_iter().map(project).collect();
        let keys = plot_keys(property_type, points.first());

        if points.is_empty() || keys.is_empty() {
            return None;
        }
        Some(Self { points, keys })
    }

    /// `(timestamp, value)` pairs of one series, skipping points without it.
    pub fn series(&self, key: &str) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|p| Some((p.timestamp()?, p.get(key)?)))
            .collect()
    }

    /// Lowest and highest timestamp among the points.
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().filter_map(ChartPoint::timestamp))
    }

    /// Lowest and highest value across the plotted series.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        bounds(
            self.keys
                .iter()
                .flat_map(|k| self.points.iter().filter_map(move |p| p.get(k))),
        )
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Keep the samples whose numeric timestamp falls inside the trailing window.
pub fn window(history: &[PropertyRecord], minutes: u32, now_ms: i64) -> Vec<&PropertyRecord> {
    let cutoff = (now_ms - i64::from(minutes) * MS_PER_MINUTE) as f64;
    history
        .iter()
        .filter(|record| record.timestamp().is_some_and(|ts| ts >= cutoff))
        .collect()
}

/// Project every numeric field of a sample into a flat point.
pub fn project(record: &PropertyRecord) -> ChartPoint {
    ChartPoint {
        values: record
            .value_map()
            .iter()
            .filter_map(|(k, v)| v.value.as_number().map(|n| (k.to_string(), n)))
            .collect(),
    }
}

/// Series to plot for a property type.
///
/// Known property types have a fixed list. Anything else uses the fields of
/// the first point, minus `timestamp`.
pub fn plot_keys(property_type: &str, first: Option<&ChartPoint>) -> Vec<String> {
    if let Some((_, keys)) = KNOWN_SERIES.iter().find(|(name, _)| *name == property_type) {
        return keys.iter().map(|k| k.to_string()).collect();
    }
    first
        .map(|p| p.keys().filter(|k| *k != TIMESTAMP_FIELD).map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FieldValue, ValueMap};

    const T0: i64 = 1_700_000_000_000;

    fn sample(key: &str, ts: i64, fields: &[(&str, f64)]) -> PropertyRecord {
        let mut map = ValueMap::new();
        map.insert(TIMESTAMP_FIELD, FieldValue::number(ts as f64));
        for (name, v) in fields {
            map.insert(*name, FieldValue::number(*v));
        }
        PropertyRecord::new(key, map)
    }

    #[test]
    fn window_keeps_recent_samples_only() {
        let history = vec![
            sample("heart-rate", T0, &[("bpm", 60.0)]),
            sample("heart-rate", T0 + 60_000, &[("bpm", 61.0)]),
            sample("heart-rate", T0 + 600_000, &[("bpm", 62.0)]),
        ];
        let now = T0 + 600_000 + 1_000;

        let kept = window(&history, 5, now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].timestamp(), Some((T0 + 600_000) as f64));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let history = vec![sample("x", T0, &[("v", 1.0)])];
        assert_eq!(window(&history, 1, T0 + 60_000).len(), 1);
        assert!(window(&history, 1, T0 + 60_001).is_empty());
    }

    #[test]
    fn samples_without_numeric_timestamp_are_dropped() {
        let mut text_ts = ValueMap::new();
        text_ts.insert(TIMESTAMP_FIELD, FieldValue::text("now"));
        text_ts.insert("bpm", FieldValue::number(70.0));

        let mut no_ts = ValueMap::new();
        no_ts.insert("bpm", FieldValue::number(70.0));

        let history = vec![
            PropertyRecord::new("heart-rate", text_ts),
            PropertyRecord::new("heart-rate", no_ts),
        ];
        assert!(window(&history, 5, T0).is_empty());
    }

    #[test]
    fn projection_keeps_numeric_fields_in_order() {
        let mut map = ValueMap::new();
        map.insert(TIMESTAMP_FIELD, FieldValue::number(1.0));
        map.insert("label", FieldValue::text("resting"));
        map.insert("bpm", FieldValue::number(70.0));
        map.insert("spo2", FieldValue::number(98.0));

        let point = project(&PropertyRecord::new("vitals", map));
        let keys: Vec<&str> = point.keys().collect();
        assert_eq!(keys, vec!["timestamp", "bpm", "spo2"]);
        assert_eq!(point.get("label"), None);
    }

    #[test]
    fn known_property_types_use_fixed_keys() {
        let odd = ChartPoint {
            values: vec![("timestamp".into(), 1.0), ("pulse".into(), 70.0)],
        };
        assert_eq!(plot_keys("heart-rate", Some(&odd)), vec!["bpm"]);
        assert_eq!(plot_keys("heart-rate", None), vec!["bpm"]);
        assert_eq!(plot_keys("blood-pressure", None), vec!["systolic", "diastolic"]);
        assert_eq!(plot_keys("mood", None), vec!["moodScore"]);
    }

    #[test]
    fn unknown_property_type_infers_keys_from_first_sample() {
        let first = ChartPoint {
            values: vec![
                ("timestamp".into(), 1.0),
                ("bpm".into(), 70.0),
                ("spo2".into(), 98.0),
            ],
        };
        assert_eq!(plot_keys("vitals", Some(&first)), vec!["bpm", "spo2"]);
        assert!(plot_keys("vitals", None).is_empty());
    }

    #[test]
    fn derive_returns_none_when_window_is_empty() {
        let history = vec![sample("heart-rate", T0, &[("bpm", 60.0)])];
        assert!(ChartData::derive(&history, "heart-rate", 5, T0 + 3_600_000).is_none());
    }

    #[test]
    fn derive_returns_none_without_plot_keys() {
        // Only a timestamp: nothing to plot for an unknown type
        let history = vec![sample("door", T0, &[])];
        assert!(ChartData::derive(&history, "door", 5, T0).is_none());
    }

    #[test]
    fn derive_builds_series_and_bounds() {
        let history = vec![
            sample("blood-pressure", T0, &[("systolic", 120.0), ("diastolic", 80.0)]),
            sample("blood-pressure", T0 + 30_000, &[("systolic", 130.0), ("diastolic", 85.0)]),
        ];
        let data = ChartData::derive(&history, "blood-pressure", 5, T0 + 60_000).unwrap();

        assert_eq!(data.keys, vec!["systolic", "diastolic"]);
        assert_eq!(
            data.series("systolic"),
            vec![(T0 as f64, 120.0), ((T0 + 30_000) as f64, 130.0)]
        );
        assert_eq!(data.time_bounds(), Some((T0 as f64, (T0 + 30_000) as f64)));
        assert_eq!(data.value_bounds(), Some((80.0, 130.0)));
    }

    #[test]
    fn fixed_keys_missing_from_samples_give_empty_series() {
        let history = vec![sample("heart-rate", T0, &[("pulse", 70.0)])];
        let data = ChartData::derive(&history, "heart-rate", 5, T0).unwrap();
        assert!(data.series("bpm").is_empty());
        assert_eq!(data.value_bounds(), None);
    }
}
