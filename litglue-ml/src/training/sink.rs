//! Destinations for values logged at epoch end.

/// Receives logged scalars. `prog_bar` marks values meant for live display.
pub trait MetricSink {
    fn log(&mut self, key: &str, value: f64, prog_bar: bool);
}

/// A logged scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedMetric {
    pub key: String,
    pub value: f64,
    pub prog_bar: bool,
}

/// Keeps every logged value in order.
#[derive(Debug, Clone, Default)]
pub struct RecordedMetrics {
    pub entries: Vec<LoggedMetric>,
}

impl RecordedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent value logged under `key`.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .rev()
            .find(|m| m.key == key)
            .map(|m| m.value)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|m| m.key.as_str()).collect()
    }
}

impl MetricSink for RecordedMetrics {
    fn log(&mut self, key: &str, value: f64, prog_bar: bool) {
        self.entries.push(LoggedMetric {
            key: key.to_string(),
            value,
            prog_bar,
        });
    }
}

/// Emits logged values as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricSink for TracingSink {
    fn log(&mut self, key: &str, value: f64, prog_bar: bool) {
        tracing::info!(metric = key, value, prog_bar, "epoch metric");
    }
}
