//! Dashboard settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `TWINWATCH_*` environment variables. Command-line flags are applied on top
//! by the binary.
//!
//! ```toml
//! api_url = "http://localhost:3000"
//! poll_interval_ms = 5000
//! chart_minutes = 5
//! stream = "127.0.0.1:7070"
//! history_limit = 10000
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::chart::DEFAULT_WINDOW_MINUTES;
use crate::poll::DEFAULT_POLL_INTERVAL;

/// Default API location.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Base URL of the twin API.
    pub api_url: String,
    /// Period between polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Initial live chart window, in minutes.
    pub chart_minutes: u32,
    /// `host:port` of a sample stream to feed the live chart.
    #[serde(default)]
    pub stream: Option<String>,
    /// Per-series sample cap for the history store.
    #[serde(default)]
    pub history_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            chart_minutes: DEFAULT_WINDOW_MINUTES,
            stream: None,
            history_limit: None,
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("poll_interval_ms", defaults.poll_interval_ms as i64)?
            .set_default("chart_minutes", i64::from(defaults.chart_minutes))?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("TWINWATCH"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the dashboard cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if self.chart_minutes == 0 {
            bail!("chart_minutes must be at least 1");
        }
        if self.api_url.trim().is_empty() {
            bail!("api_url must not be empty");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.poll_interval(), Duration::from_millis(5000));
        assert_eq!(settings.chart_minutes, 5);
        assert!(settings.stream.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
api_url = "http://twins.example:8080"
poll_interval_ms = 2000
stream = "127.0.0.1:7070"
history_limit = 500
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.api_url, "http://twins.example:8080");
        assert_eq!(settings.poll_interval_ms, 2000);
        assert_eq!(settings.chart_minutes, 5);
        assert_eq!(settings.stream.as_deref(), Some("127.0.0.1:7070"));
        assert_eq!(settings.history_limit, Some(500));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/twinwatch.toml"))).is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "poll_interval_ms = 0").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "this is not = = toml").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }
}
