//! Query builder model.
//!
//! Holds the form state of the query builder page and derives the query
//! object sent to the external query API. The query is re-derived from the
//! form on demand and never stored.

use serde::{Serialize, Serializer};

/// Whether the query aggregates over selected twins or searches for twins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    #[default]
    Aggregate,
    Search,
}

impl QueryMode {
    pub fn toggle(self) -> Self {
        match self {
            QueryMode::Aggregate => QueryMode::Search,
            QueryMode::Search => QueryMode::Aggregate,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryMode::Aggregate => "Aggregate",
            QueryMode::Search => "Search DTs",
        }
    }
}

/// Aggregate operation applied to the target property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOperation {
    #[default]
    Avg,
    Min,
    Max,
}

impl AggregateOperation {
    pub const ALL: [AggregateOperation; 3] =
        [AggregateOperation::Avg, AggregateOperation::Min, AggregateOperation::Max];

    pub fn next(self) -> Self {
        match self {
            AggregateOperation::Avg => AggregateOperation::Min,
            AggregateOperation::Min => AggregateOperation::Max,
            AggregateOperation::Max => AggregateOperation::Avg,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            AggregateOperation::Avg => AggregateOperation::Max,
            AggregateOperation::Min => AggregateOperation::Avg,
            AggregateOperation::Max => AggregateOperation::Min,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AggregateOperation::Avg => "avg",
            AggregateOperation::Min => "min",
            AggregateOperation::Max => "max",
        }
    }
}

/// Comparison operator of a filter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FilterOperator {
    #[serde(rename = "<")]
    Lt,
    #[default]
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

impl FilterOperator {
    /// Cycle order matches the operator picker: <, >, <=, >=, =.
    pub fn next(self) -> Self {
        match self {
            FilterOperator::Lt => FilterOperator::Gt,
            FilterOperator::Gt => FilterOperator::Le,
            FilterOperator::Le => FilterOperator::Ge,
            FilterOperator::Ge => FilterOperator::Eq,
            FilterOperator::Eq => FilterOperator::Lt,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FilterOperator::Lt => FilterOperator::Eq,
            FilterOperator::Gt => FilterOperator::Lt,
            FilterOperator::Le => FilterOperator::Gt,
            FilterOperator::Ge => FilterOperator::Le,
            FilterOperator::Eq => FilterOperator::Ge,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Lt => "<",
            FilterOperator::Gt => ">",
            FilterOperator::Eq => "=",
            FilterOperator::Le => "<=",
            FilterOperator::Ge => ">=",
        }
    }
}

/// A filter row as typed into the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRow {
    pub property_name: String,
    pub op: FilterOperator,
    pub value: String,
}

impl FilterRow {
    pub fn new(property_name: &str, op: FilterOperator, value: &str) -> Self {
        Self {
            property_name: property_name.to_string(),
            op,
            value: value.to_string(),
        }
    }

    /// Replace the value text if it consists of digits only.
    ///
    /// Returns false (and keeps the previous text) otherwise.
    pub fn set_value(&mut self, text: &str) -> bool {
        if text.chars().all(|c| c.is_ascii_digit()) {
            self.value = text.to_string();
            true
        } else {
            false
        }
    }

    /// Normalize this row, or `None` if the name or value is blank.
    ///
    /// Non-numeric text becomes NaN and is passed through.
    pub fn normalize(&self) -> Option<QueryFilter> {
        if self.property_name.trim().is_empty() || self.value.trim().is_empty() {
            return None;
        }
        Some(QueryFilter {
            property_name: self.property_name.clone(),
            op: self.op,
            value: coerce_number(&self.value),
        })
    }
}

/// Numeric coercion of form text. Surrounding whitespace is ignored and
/// anything unparseable becomes NaN.
fn coerce_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// A normalized filter in the emitted query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFilter {
    #[serde(rename = "propertyName")]
    pub property_name: String,
    pub op: FilterOperator,
    #[serde(serialize_with = "serialize_number")]
    pub value: f64,
}

/// Whole numbers are written without a fractional part (`10`, not `10.0`).
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// The query object handed to the external query API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Query {
    Aggregate {
        operation: AggregateOperation,
        property: String,
        filters: Vec<QueryFilter>,
        dts: Vec<String>,
    },
    Search {
        property: String,
        filters: Vec<QueryFilter>,
    },
}

impl Query {
    pub fn mode(&self) -> QueryMode {
        match self {
            Query::Aggregate { .. } => QueryMode::Aggregate,
            Query::Search { .. } => QueryMode::Search,
        }
    }

    /// Prefix used when logging a generated query.
    pub fn log_label(&self) -> &'static str {
        match self {
            Query::Aggregate { .. } => "Aggregate query:",
            Query::Search { .. } => "Search query:",
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Drop blank rows and coerce the rest.
pub fn normalize_filters(rows: &[FilterRow]) -> Vec<QueryFilter> {
    rows.iter().filter_map(FilterRow::normalize).collect()
}

/// State of the query builder form.
#[derive(Debug, Clone, Default)]
pub struct QueryForm {
    pub mode: QueryMode,
    pub operation: AggregateOperation,
    pub property: String,
    /// Twin ids selected for aggregation, in selection order.
    pub dts: Vec<String>,
    pub filters: Vec<FilterRow>,
}

impl QueryForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty filter row (`op` defaults to `>`).
    pub fn add_filter(&mut self) {
        self.filters.push(FilterRow::default());
    }

    pub fn remove_filter(&mut self, index: usize) {
        if index < self.filters.len() {
            self.filters.remove(index);
        }
    }

    pub fn is_selected(&self, dt: &str) -> bool {
        self.dts.iter().any(|d| d == dt)
    }

    /// Check or uncheck a twin.
    pub fn set_selected(&mut self, dt: &str, checked: bool) {
        if checked {
            if !self.is_selected(dt) {
                self.dts.push(dt.to_string());
            }
        } else {
            self.dts.retain(|d| d != dt);
        }
    }

    pub fn toggle_dt(&mut self, dt: &str) {
        let checked = self.is_selected(dt);
        self.set_selected(dt, !checked);
    }

    /// Derive the query for the current form state.
    pub fn query(&self) -> Query {
        let filters = normalize_filters(&self.filters);
        match self.mode {
            QueryMode::Aggregate => Query::Aggregate {
                operation: self.operation,
                property: self.property.clone(),
                filters,
                dts: self.dts.clone(),
            },
            QueryMode::Search => Query::Search {
                property: self.property.clone(),
                filters,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_rows() -> Vec<FilterRow> {
        vec![
            FilterRow::new("age", FilterOperator::Gt, "10"),
            FilterRow::new("", FilterOperator::Eq, "5"),
            FilterRow::new("x", FilterOperator::Lt, ""),
        ]
    }

    #[test]
    fn blank_rows_are_dropped() {
        let filters = normalize_filters(&sample_rows());
        assert_eq!(
            filters,
            vec![QueryFilter {
                property_name: "age".into(),
                op: FilterOperator::Gt,
                value: 10.0,
            }]
        );
    }

    #[test]
    fn whitespace_only_fields_count_as_blank() {
        let rows = vec![
            FilterRow::new("   ", FilterOperator::Eq, "5"),
            FilterRow::new("age", FilterOperator::Eq, "  "),
        ];
        assert!(normalize_filters(&rows).is_empty());
    }

    #[test]
    fn aggregate_query_shape() {
        let form = QueryForm {
            mode: QueryMode::Aggregate,
            operation: AggregateOperation::Avg,
            property: "heart-rate".into(),
            dts: vec!["dtA".into(), "dtB".into()],
            filters: sample_rows(),
        };

        let value = serde_json::to_value(form.query()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "aggregate",
                "operation": "avg",
                "property": "heart-rate",
                "filters": [{ "propertyName": "age", "op": ">", "value": 10 }],
                "dts": ["dtA", "dtB"]
            })
        );
    }

    #[test]
    fn search_query_omits_operation_and_dts() {
        let form = QueryForm {
            mode: QueryMode::Search,
            operation: AggregateOperation::Max,
            property: "mood".into(),
            dts: vec!["dtA".into()],
            filters: vec![FilterRow::new("age", FilterOperator::Le, "65")],
        };

        let value = serde_json::to_value(form.query()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "search",
                "property": "mood",
                "filters": [{ "propertyName": "age", "op": "<=", "value": 65 }]
            })
        );
        assert_eq!(form.query().log_label(), "Search query:");
    }

    #[test]
    fn whole_filter_values_serialize_as_integers() {
        let whole = FilterRow::new("age", FilterOperator::Gt, "10").normalize().unwrap();
        let text = serde_json::to_string(&whole).unwrap();
        assert_eq!(text, r#"{"propertyName":"age","op":">","value":10}"#);

        let fractional = QueryFilter {
            property_name: "temp".into(),
            op: FilterOperator::Lt,
            value: 37.5,
        };
        let text = serde_json::to_string(&fractional).unwrap();
        assert!(text.ends_with(r#""value":37.5}"#), "{text}");
    }

    #[test]
    fn non_numeric_value_passes_through_as_nan() {
        let row = FilterRow::new("age", FilterOperator::Ge, "ten");
        let filter = row.normalize().unwrap();
        assert!(filter.value.is_nan());

        // serde_json has no NaN, so it is emitted as null
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value["value"], serde_json::Value::Null);
    }

    #[test]
    fn value_input_accepts_digits_only() {
        let mut row = FilterRow::default();
        assert!(row.set_value("14"));
        assert!(!row.set_value("14a"));
        assert_eq!(row.value, "14");
        assert!(row.set_value(""));
        assert_eq!(row.value, "");
    }

    #[test]
    fn new_rows_default_to_greater_than() {
        let mut form = QueryForm::new();
        form.add_filter();
        assert_eq!(form.filters[0].op, FilterOperator::Gt);
        assert!(form.filters[0].property_name.is_empty());
    }

    #[test]
    fn remove_filter_ignores_out_of_range() {
        let mut form = QueryForm::new();
        form.add_filter();
        form.add_filter();
        form.remove_filter(5);
        assert_eq!(form.filters.len(), 2);
        form.remove_filter(0);
        assert_eq!(form.filters.len(), 1);
    }

    #[test]
    fn twin_selection_keeps_order_and_no_duplicates() {
        let mut form = QueryForm::new();
        form.toggle_dt("dtB");
        form.toggle_dt("dtA");
        form.set_selected("dtB", true);
        assert_eq!(form.dts, vec!["dtB", "dtA"]);

        form.toggle_dt("dtB");
        assert_eq!(form.dts, vec!["dtA"]);
    }

    #[test]
    fn operator_cycle_visits_every_operator() {
        let mut op = FilterOperator::Lt;
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(op.symbol());
            op = op.next();
        }
        assert_eq!(op, FilterOperator::Lt);
        assert_eq!(seen, vec!["<", ">", "<=", ">=", "="]);
        assert_eq!(FilterOperator::Lt.next().prev(), FilterOperator::Lt);
    }
}
