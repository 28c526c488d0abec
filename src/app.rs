//! Application state and navigation logic.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{HdtApi, HdtStatus};
use crate::data::chart::{ChartData, DEFAULT_WINDOW_MINUTES};
use crate::data::pattern::PatternFilter;
use crate::data::query::QueryForm;
use crate::data::status::{self, StatusRow};
use crate::error::ApiError;
use crate::input::FilterInput;
use crate::poll::{spawn_poll, KeyedPoll, DEFAULT_POLL_INTERVAL};
use crate::settings::Settings;
use crate::stream::{HistoryStore, StreamFeed};
use crate::ui::Theme;

/// The current page of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// All known twins.
    Twins,
    /// Current property values of the selected twin.
    Detail,
    /// Property list and live chart of the selected twin.
    Live,
    /// Aggregate/search query builder.
    Query,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Twins => View::Detail,
            View::Detail => View::Live,
            View::Live => View::Query,
            View::Query => View::Twins,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Twins => View::Query,
            View::Detail => View::Twins,
            View::Live => View::Detail,
            View::Query => View::Live,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Twins => "Twins",
            View::Detail => "State",
            View::Live => "Live",
            View::Query => "Query",
        }
    }
}

/// Result of a background fetch, delivered to the UI thread.
///
/// Poll results carry the twin id they were issued for.
#[derive(Debug)]
pub enum Update {
    Twins(Result<Vec<String>, ApiError>),
    Status {
        dt: String,
        result: Result<HdtStatus, ApiError>,
    },
    Properties {
        dt: String,
        result: Result<Vec<String>, ApiError>,
    },
}

/// Twin list page state.
#[derive(Debug, Clone)]
pub struct TwinsState {
    pub ids: Vec<String>,
    pub loading: bool,
    pub search: FilterInput,
    pub selected: usize,
}

impl Default for TwinsState {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            loading: true,
            search: FilterInput::new("Search twins..."),
            selected: 0,
        }
    }
}

/// Detail page state. Reset whenever the page is entered for a twin.
#[derive(Debug, Clone)]
pub struct DetailState {
    pub snapshot: HdtStatus,
    /// True until the first fetch completes, successfully or not.
    pub loading: bool,
    pub search: FilterInput,
    pub selected: usize,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            snapshot: HdtStatus::default(),
            loading: true,
            search: FilterInput::new("Search property..."),
            selected: 0,
        }
    }
}

/// Property-live page state.
#[derive(Debug, Clone)]
pub struct LiveState {
    pub properties: Vec<String>,
    pub selected: Option<String>,
    pub search: FilterInput,
    /// Trailing chart window in minutes, at least 1.
    pub minutes: u32,
}

impl LiveState {
    fn new(minutes: u32) -> Self {
        Self {
            properties: Vec::new(),
            selected: None,
            search: FilterInput::new("Search properties..."),
            minutes: minutes.max(1),
        }
    }
}

/// A focusable row of the query builder form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Mode,
    Operation,
    Property,
    Twin(usize),
    FilterName(usize),
    FilterOp(usize),
    FilterValue(usize),
    AddFilter,
    Generate,
}

impl FormField {
    /// Fields that take typed text.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            FormField::Property | FormField::FilterName(_) | FormField::FilterValue(_)
        )
    }
}

/// Query builder page state.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub form: QueryForm,
    pub focus: usize,
    /// Pretty JSON of the last generated query, shown as an overlay.
    pub generated: Option<String>,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    api: Arc<dyn HdtApi>,
    pub history: HistoryStore,
    feed: Option<StreamFeed>,
    poll_interval: Duration,

    updates_tx: mpsc::UnboundedSender<Update>,
    updates_rx: mpsc::UnboundedReceiver<Update>,

    /// Twin shown by the detail and live pages.
    pub dt: Option<String>,
    detail_poll: Option<KeyedPoll>,
    property_poll: Option<KeyedPoll>,

    pub twins: TwinsState,
    pub detail: DetailState,
    pub live: LiveState,
    pub query: QueryState,

    pub load_error: Option<String>,
    pub last_update: Option<Instant>,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `api` and charting from `history`.
    pub fn new(api: Arc<dyn HdtApi>, history: HistoryStore, settings: &Settings) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            running: true,
            current_view: View::Twins,
            show_help: false,
            api,
            history,
            feed: None,
            poll_interval: settings.poll_interval(),
            updates_tx,
            updates_rx,
            dt: None,
            detail_poll: None,
            property_poll: None,
            twins: TwinsState::default(),
            detail: DetailState::default(),
            live: LiveState::new(settings.chart_minutes),
            query: QueryState::default(),
            load_error: None,
            last_update: None,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Create an App with default settings.
    pub fn with_api(api: Arc<dyn HdtApi>) -> Self {
        Self::new(api, HistoryStore::new(), &Settings::default())
    }

    /// Attach a stream feed; it lives as long as the app.
    pub fn attach_feed(&mut self, feed: StreamFeed) {
        self.feed = Some(feed);
    }

    /// Returns a description of the data sources.
    pub fn source_description(&self) -> String {
        match &self.feed {
            Some(feed) => format!("{} | {}", self.api.description(), feed.description()),
            None => self.api.description().to_string(),
        }
    }

    /// Last error reported by the stream feed, if any.
    pub fn feed_error(&self) -> Option<String> {
        self.feed.as_ref().and_then(StreamFeed::last_error)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    // ----- Background fetching -----

    /// Fetch the twin list once.
    pub fn fetch_twins(&mut self) {
        self.twins.loading = true;
        let api = self.api.clone();
        let tx = self.updates_tx.clone();
        tokio::spawn(async move {
            let result = api.list_twins().await;
            let _ = tx.send(Update::Twins(result));
        });
    }

    fn start_status_poll(&self, dt: String) -> KeyedPoll {
        let api = self.api.clone();
        let tx = self.updates_tx.clone();
        let id = dt.clone();
        let handle = spawn_poll(self.poll_interval, move || {
            let api = api.clone();
            let tx = tx.clone();
            let dt = id.clone();
            async move {
                let result = api.twin_state(&dt).await;
                let _ = tx.send(Update::Status { dt, result });
            }
        });
        debug!("Started state poll for {}", dt);
        KeyedPoll::new(dt, handle)
    }

    fn start_property_poll(&self, dt: String) -> KeyedPoll {
        let api = self.api.clone();
        let tx = self.updates_tx.clone();
        let id = dt.clone();
        let handle = spawn_poll(self.poll_interval, move || {
            let api = api.clone();
            let tx = tx.clone();
            let dt = id.clone();
            async move {
                let result = api.twin_properties(&dt).await;
                let _ = tx.send(Update::Properties { dt, result });
            }
        });
        debug!("Started property poll for {}", dt);
        KeyedPoll::new(dt, handle)
    }

    fn wanted_poll(&self, view: View) -> Option<String> {
        if self.current_view == view {
            self.dt.clone()
        } else {
            None
        }
    }

    /// Start or stop pollers to match the current view and twin.
    ///
    /// A page whose poller is replaced starts from fresh state, and the
    /// error reported by the old poller is dropped.
    fn sync_polls(&mut self) {
        let want = self.wanted_poll(View::Detail);
        if self.detail_poll.as_ref().map(KeyedPoll::key) != want.as_deref() {
            if self.detail_poll.take().is_some() {
                self.load_error = None;
            }
            if let Some(dt) = want {
                self.detail = DetailState::default();
                self.detail_poll = Some(self.start_status_poll(dt));
            }
        }

        let want = self.wanted_poll(View::Live);
        if self.property_poll.as_ref().map(KeyedPoll::key) != want.as_deref() {
            if self.property_poll.take().is_some() {
                self.load_error = None;
            }
            if let Some(dt) = want {
                let minutes = self.live.minutes;
                self.live = LiveState::new(minutes);
                self.property_poll = Some(self.start_property_poll(dt));
            }
        }
    }

    /// Returns true while the state poller for `dt` is running.
    pub fn is_polling_state(&self, dt: &str) -> bool {
        self.detail_poll.as_ref().is_some_and(|p| p.key() == dt && p.is_active())
    }

    /// Returns true while the property poller for `dt` is running.
    pub fn is_polling_properties(&self, dt: &str) -> bool {
        self.property_poll.as_ref().is_some_and(|p| p.key() == dt && p.is_active())
    }

    /// Apply all pending background results.
    ///
    /// Returns true if anything was applied.
    pub fn apply_updates(&mut self) -> bool {
        let mut applied = false;
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply(update);
            applied = true;
        }
        applied
    }

    /// Apply one background result.
    pub fn apply(&mut self, update: Update) {
        match update {
            Update::Twins(Ok(ids)) => {
                info!("Fetched {} twins", ids.len());
                self.twins.ids = ids;
                self.twins.loading = false;
                self.load_error = None;
                self.clamp_twin_selection();
            }
            Update::Twins(Err(e)) => {
                warn!("Failed to fetch DT list: {}", e);
                self.twins.ids.clear();
                self.twins.loading = false;
                self.twins.selected = 0;
                self.load_error = Some(e.to_string());
            }
            Update::Status { dt, result } => {
                if self.detail_poll.as_ref().map(KeyedPoll::key) != Some(dt.as_str()) {
                    debug!("Discarding state for {} (no longer shown)", dt);
                    return;
                }
                self.detail.loading = false;
                match result {
                    Ok(snapshot) => {
                        debug!("Fetched state for {}: {} properties", dt, snapshot.properties.len());
                        self.detail.snapshot = snapshot;
                        self.last_update = Some(Instant::now());
                        self.load_error = None;
                        self.clamp_detail_selection();
                    }
                    Err(e) => {
                        warn!("Failed to fetch DT state for {}: {}", dt, e);
                        self.load_error = Some(e.to_string());
                    }
                }
            }
            Update::Properties { dt, result } => {
                if self.property_poll.as_ref().map(KeyedPoll::key) != Some(dt.as_str()) {
                    debug!("Discarding properties for {} (no longer shown)", dt);
                    return;
                }
                match result {
                    Ok(names) => {
                        debug!("Fetched properties for {}: {:?}", dt, names);
                        if self.live.selected.is_none() {
                            self.live.selected = names.first().cloned();
                        }
                        self.live.properties = names;
                        self.last_update = Some(Instant::now());
                        self.load_error = None;
                    }
                    Err(e) => {
                        warn!("Failed to fetch DT properties for {}: {}", dt, e);
                        self.live.properties.clear();
                        self.load_error = Some(e.to_string());
                    }
                }
            }
        }
    }

    /// Refetch the twin list and restart the running pollers.
    pub fn reload(&mut self) {
        self.fetch_twins();
        if let Some(poll) = self.detail_poll.take() {
            self.detail_poll = Some(self.start_status_poll(poll.key().to_string()));
        }
        if let Some(poll) = self.property_poll.take() {
            self.property_poll = Some(self.start_property_poll(poll.key().to_string()));
        }
    }

    // ----- Navigation -----

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.sync_polls();
    }

    /// Show the detail page of a twin.
    pub fn open_detail(&mut self, dt: &str) {
        self.dt = Some(dt.to_string());
        self.set_view(View::Detail);
    }

    /// Show the live page of a twin, optionally preselecting a property.
    pub fn open_live(&mut self, dt: &str, property: Option<&str>) {
        self.dt = Some(dt.to_string());
        self.set_view(View::Live);
        if let Some(property) = property {
            self.live.selected = Some(property.to_string());
        }
    }

    /// Navigate back towards the twin list.
    pub fn go_back(&mut self) {
        match self.current_view {
            View::Twins => {}
            View::Live if self.dt.is_some() => self.set_view(View::Detail),
            _ => self.set_view(View::Twins),
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    // ----- Twin list -----

    /// Twins matching the search text.
    pub fn visible_twins(&self) -> Vec<&String> {
        PatternFilter::new(self.twins.search.value()).apply(&self.twins.ids, |id| id.as_str())
    }

    pub fn selected_twin(&self) -> Option<String> {
        self.visible_twins().get(self.twins.selected).map(|id| id.to_string())
    }

    fn clamp_twin_selection(&mut self) {
        let count = self.visible_twins().len();
        self.twins.selected = self.twins.selected.min(count.saturating_sub(1));
    }

    // ----- Detail -----

    /// Rows of the detail table after filtering.
    pub fn detail_rows(&self) -> Vec<StatusRow> {
        status::rows(&self.detail.snapshot, self.detail.search.value())
    }

    fn clamp_detail_selection(&mut self) {
        let count = self.detail_rows().len();
        self.detail.selected = self.detail.selected.min(count.saturating_sub(1));
    }

    /// Open the live chart for the selected detail row.
    pub fn open_selected_property(&mut self) {
        let Some(dt) = self.dt.clone() else {
            return;
        };
        let key = self.detail_rows().get(self.detail.selected).map(|r| r.key.clone());
        self.open_live(&dt, key.as_deref());
    }

    // ----- Live -----

    /// Properties matching the search text.
    pub fn visible_properties(&self) -> Vec<&String> {
        PatternFilter::new(self.live.search.value()).apply(&self.live.properties, |p| p.as_str())
    }

    /// Move the property selection within the visible list.
    pub fn move_property_selection(&mut self, delta: isize) {
        let visible = self.visible_properties();
        if visible.is_empty() {
            return;
        }
        let current = self
            .live
            .selected
            .as_ref()
            .and_then(|sel| visible.iter().position(|p| *p == sel));
        let next = match current {
            Some(i) => (i as isize + delta).clamp(0, visible.len() as isize - 1) as usize,
            None => 0,
        };
        self.live.selected = Some(visible[next].clone());
    }

    /// Chart data for the selected property at time `now_ms`.
    pub fn chart_data(&self, now_ms: i64) -> Option<ChartData> {
        let dt = self.dt.as_deref()?;
        let property = self.live.selected.as_deref()?;
        let history = self.history.snapshot(dt, property);
        ChartData::derive(&history, property, self.live.minutes, now_ms)
    }

    pub fn widen_window(&mut self) {
        self.live.minutes = self.live.minutes.saturating_add(1);
    }

    pub fn narrow_window(&mut self) {
        self.live.minutes = self.live.minutes.saturating_sub(1).max(1);
    }

    pub fn reset_window(&mut self) {
        self.live.minutes = DEFAULT_WINDOW_MINUTES;
    }

    // ----- Selection in lists -----

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::Twins => {
                let max = self.visible_twins().len().saturating_sub(1);
                self.twins.selected = (self.twins.selected + n).min(max);
            }
            View::Detail => {
                let max = self.detail_rows().len().saturating_sub(1);
                self.detail.selected = (self.detail.selected + n).min(max);
            }
            View::Live => self.move_property_selection(n as isize),
            View::Query => self.query_focus_next(),
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Twins => self.twins.selected = self.twins.selected.saturating_sub(n),
            View::Detail => self.detail.selected = self.detail.selected.saturating_sub(n),
            View::Live => self.move_property_selection(-(n as isize)),
            View::Query => self.query_focus_prev(),
        }
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// The search input of the current view, if it has one.
    pub fn active_search(&self) -> Option<&FilterInput> {
        match self.current_view {
            View::Twins => Some(&self.twins.search),
            View::Detail => Some(&self.detail.search),
            View::Live => Some(&self.live.search),
            View::Query => None,
        }
    }

    /// Mutable access to the search input of the current view.
    pub fn active_search_mut(&mut self) -> Option<&mut FilterInput> {
        match self.current_view {
            View::Twins => Some(&mut self.twins.search),
            View::Detail => Some(&mut self.detail.search),
            View::Live => Some(&mut self.live.search),
            View::Query => None,
        }
    }

    /// Reset list positions after the search text changed.
    pub fn search_changed(&mut self) {
        match self.current_view {
            View::Twins => self.twins.selected = 0,
            View::Detail => self.detail.selected = 0,
            _ => {}
        }
    }

    /// True while keystrokes should go to a text field rather than shortcuts.
    pub fn is_editing(&self) -> bool {
        match self.current_view {
            View::Query => self.query_focus().is_text(),
            _ => self.active_search().is_some_and(FilterInput::is_active),
        }
    }

    // ----- Query builder -----

    /// Focusable fields of the form, top to bottom.
    pub fn query_fields(&self) -> Vec<FormField> {
        let form = &self.query.form;
        let aggregate = form.mode == crate::data::QueryMode::Aggregate;

        let mut fields = vec![FormField::Mode];
        if aggregate {
            fields.push(FormField::Operation);
        }
        fields.push(FormField::Property);
        if aggregate && !self.twins.loading {
            fields.extend((0..self.twins.ids.len()).map(FormField::Twin));
        }
        for i in 0..form.filters.len() {
            fields.push(FormField::FilterName(i));
            fields.push(FormField::FilterOp(i));
            fields.push(FormField::FilterValue(i));
        }
        fields.push(FormField::AddFilter);
        fields.push(FormField::Generate);
        fields
    }

    pub fn query_focus(&self) -> FormField {
        let fields = self.query_fields();
        fields
            .get(self.query.focus.min(fields.len() - 1))
            .copied()
            .unwrap_or(FormField::Mode)
    }

    fn focus_field(&mut self, field: FormField) {
        if let Some(i) = self.query_fields().iter().position(|f| *f == field) {
            self.query.focus = i;
        }
    }

    pub fn query_focus_next(&mut self) {
        let max = self.query_fields().len() - 1;
        self.query.focus = (self.query.focus + 1).min(max);
    }

    pub fn query_focus_prev(&mut self) {
        let max = self.query_fields().len() - 1;
        self.query.focus = self.query.focus.min(max).saturating_sub(1);
    }

    /// Activate the focused field (toggle, cycle, add or generate).
    pub fn query_activate(&mut self) {
        match self.query_focus() {
            FormField::Mode => {
                self.query.form.mode = self.query.form.mode.toggle();
                self.focus_field(FormField::Mode);
            }
            FormField::Operation => self.query.form.operation = self.query.form.operation.next(),
            FormField::Twin(i) => {
                if let Some(dt) = self.twins.ids.get(i).cloned() {
                    self.query.form.toggle_dt(&dt);
                }
            }
            FormField::FilterOp(i) => {
                if let Some(row) = self.query.form.filters.get_mut(i) {
                    row.op = row.op.next();
                }
            }
            FormField::AddFilter => {
                self.query.form.add_filter();
                let index = self.query.form.filters.len() - 1;
                self.focus_field(FormField::FilterName(index));
            }
            FormField::Generate => self.generate_query(),
            FormField::Property | FormField::FilterName(_) | FormField::FilterValue(_) => {
                self.query_focus_next();
            }
        }
    }

    /// Cycle the focused choice backwards or forwards.
    pub fn query_cycle(&mut self, forward: bool) {
        match self.query_focus() {
            FormField::Mode => {
                self.query.form.mode = self.query.form.mode.toggle();
                self.focus_field(FormField::Mode);
            }
            FormField::Operation => {
                let op = self.query.form.operation;
                self.query.form.operation = if forward { op.next() } else { op.prev() };
            }
            FormField::FilterOp(i) => {
                if let Some(row) = self.query.form.filters.get_mut(i) {
                    row.op = if forward { row.op.next() } else { row.op.prev() };
                }
            }
            _ => {}
        }
    }

    /// Type a character into the focused text field.
    pub fn query_input(&mut self, c: char) {
        match self.query_focus() {
            FormField::Property => self.query.form.property.push(c),
            FormField::FilterName(i) => {
                if let Some(row) = self.query.form.filters.get_mut(i) {
                    row.property_name.push(c);
                }
            }
            FormField::FilterValue(i) => {
                if let Some(row) = self.query.form.filters.get_mut(i) {
                    let text = format!("{}{}", row.value, c);
                    row.set_value(&text);
                }
            }
            _ => {}
        }
    }

    /// Delete the last character of the focused text field.
    pub fn query_backspace(&mut self) {
        match self.query_focus() {
            FormField::Property => {
                self.query.form.property.pop();
            }
            FormField::FilterName(i) => {
                if let Some(row) = self.query.form.filters.get_mut(i) {
                    row.property_name.pop();
                }
            }
            FormField::FilterValue(i) => {
                if let Some(row) = self.query.form.filters.get_mut(i) {
                    row.value.pop();
                }
            }
            _ => {}
        }
    }

    /// Remove the filter row that holds the focus.
    pub fn query_remove_filter(&mut self) {
        let index = match self.query_focus() {
            FormField::FilterName(i) | FormField::FilterOp(i) | FormField::FilterValue(i) => i,
            _ => return,
        };
        self.query.form.remove_filter(index);
        let max = self.query_fields().len() - 1;
        self.query.focus = self.query.focus.min(max);
    }

    /// Build the query from the form, log it and show it.
    pub fn generate_query(&mut self) {
        let query = self.query.form.query();
        match query.to_json_pretty() {
            Ok(json) => {
                info!("{} {}", query.log_label(), json);
                self.query.generated = Some(json);
            }
            Err(e) => {
                warn!("Failed to serialize query: {}", e);
                self.set_status_message(format!("Query failed: {}", e));
            }
        }
    }

    /// Export the query for the current form to a file.
    pub fn export_query(&self, path: &Path) -> Result<()> {
        let json = self.query.form.query().to_json_pretty()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Export the current detail snapshot to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(ref dt) = self.dt else {
            anyhow::bail!("No twin selected");
        };
        if self.detail.loading {
            anyhow::bail!("No state loaded for {}", dt);
        }
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "dt": dt,
            "state": self.detail.snapshot,
        }))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
