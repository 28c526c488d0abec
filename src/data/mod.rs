//! Data models and processing for twin snapshots and queries.
//!
//! This module holds the logic behind the views, independent of rendering.
//!
//! ## Submodules
//!
//! - [`pattern`]: Case-insensitive regex filtering that fails open on invalid patterns
//! - [`status`]: Detail table rows built from a state snapshot
//! - [`chart`]: Windowing and series extraction for the live chart
//! - [`query`]: Query builder form model and the emitted query object
//!
//! ## Data Flow
//!
//! ```text
//! HdtStatus (polled JSON)          HistoryStore (stream feed)
//!        │                                 │
//!        ▼                                 ▼
//! status::rows(search)             ChartData::derive(window)
//!        │                                 │
//!        └───────────────▶ ui ◀────────────┘
//! ```

pub mod chart;
pub mod pattern;
pub mod query;
pub mod status;

pub use chart::{ChartData, ChartPoint};
pub use pattern::PatternFilter;
pub use query::{
    AggregateOperation, FilterOperator, FilterRow, Query, QueryFilter, QueryForm, QueryMode,
};
pub use status::StatusRow;
