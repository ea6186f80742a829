use std::env;
use std::time::Duration;

pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound for one test case, fixture setup included
    pub test_timeout: Duration,
    pub report_format: ReportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_timeout: Duration::from_millis(DEFAULT_TEST_TIMEOUT_MS),
            report_format: ReportFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            test_timeout: env::var("GDSENTRY_TEST_TIMEOUT_MS")
                .ok()
                .and_then(|raw| parse_timeout(&raw))
                .unwrap_or(defaults.test_timeout),
            report_format: env::var("GDSENTRY_REPORT_FORMAT")
                .ok()
                .and_then(|raw| {
                    let format = ReportFormat::parse(&raw);
                    if format.is_none() {
                        tracing::warn!(value = %raw, "Unknown GDSENTRY_REPORT_FORMAT, using text");
                    }
                    format
                })
                .unwrap_or(defaults.report_format),
        }
    }

    /// Apply command-line flags on top of the environment
    pub fn with_overrides(mut self, timeout_ms: Option<u64>, json: bool) -> Self {
        if let Some(ms) = timeout_ms {
            self.test_timeout = Duration::from_millis(ms);
        }
        if json {
            self.report_format = ReportFormat::Json;
        }
        self
    }
}

fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => {
            tracing::warn!(value = %raw, "Invalid GDSENTRY_TEST_TIMEOUT_MS, using default");
            None
        }
        Ok(ms) => Some(Duration::from_millis(ms)),
    }
}
