// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # twinwatch
//!
//! A terminal dashboard and library for monitoring digital twins through the
//! twin REST API.
//!
//! The dashboard lists the known twins, shows the current property values of
//! one twin, charts recent samples of a property, and builds aggregate or
//! search queries for the external query API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │(processing)   │(rendering)   │          │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘  │
//! │       │ poll (interval tasks)                                │
//! │       ▼                                                      │
//! │  ┌─────────┐                    ┌──────────────┐             │
//! │  │   api   │◀── HttpApi         │    stream    │◀── TCP feed │
//! │  │ (REST)  │                    │(HistoryStore)│             │
//! │  └─────────┘                    └──────────────┘             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation, and poll lifecycle
//! - **[`api`]**: The [`HdtApi`] trait and its HTTP implementation
//! - **[`poll`]**: Cancellable interval polling
//! - **[`stream`]**: Per-twin sample history fed by a newline-delimited JSON stream
//! - **[`data`]**: Search filtering, table rows, chart series and the query model
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Browse twins served by a local API
//! twinwatch --api http://localhost:3000
//!
//! # Open one twin and chart samples from a stream bridge
//! twinwatch --dt patient-1 --stream 127.0.0.1:7070
//!
//! # Write the current state of a twin to a file and exit
//! twinwatch --dt patient-1 --export state.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use twinwatch::{App, HttpApi};
//!
//! let api = Arc::new(HttpApi::new("http://localhost:3000"));
//! let app = App::with_api(api);
//! ```
//!
//! ### Feeding the chart from a byte channel
//!
//! ```no_run
//! use twinwatch::{HistoryStore, StreamFeed};
//! use tokio::sync::mpsc;
//!
//! # tokio_test::block_on(async {
//! let store = HistoryStore::new();
//! let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
//! let feed = StreamFeed::from_bytes_channel(rx, store.clone(), "bridge");
//! # });
//! ```

pub mod api;
pub mod app;
pub mod data;
pub mod error;
pub mod events;
pub mod input;
pub mod poll;
pub mod settings;
pub mod stream;
pub mod ui;

// Re-export main types for convenience
pub use api::{FieldValue, HdtApi, HdtStatus, HttpApi, PropertyRecord, Scalar, ValueMap};
pub use app::{App, View};
pub use data::{ChartData, PatternFilter, Query, QueryForm, QueryMode, StatusRow};
pub use error::ApiError;
pub use poll::{spawn_poll, PollHandle};
pub use settings::Settings;
pub use stream::{HistoryStore, StreamFeed, StreamMessage};
