use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::models::NOT_AVAILABLE;

/// Column names of the log, in the order `Sample::fields` writes them.
pub const HEADER: [&str; 7] = [
    "timestamp",
    "battery_percent",
    "power_w",
    "cpu_util_percent",
    "cpu_clock",
    "temperature_c",
    "top_processes",
];

/// One observation of every metric at a single instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<FixedOffset>,
    pub battery_percent: Option<u8>,
    pub power_watts: Option<f64>,
    pub cpu_util_percent: Option<f64>,
    /// Canonical "<value> MHz" text of the first core.
    pub cpu_clock: Option<String>,
    pub temperature_celsius: Option<f64>,
    /// Command names, busiest first.
    pub top_processes: Vec<String>,
}

impl Sample {
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp,
            battery_percent: None,
            power_watts: None,
            cpu_util_percent: None,
            cpu_clock: None,
            temperature_celsius: None,
            top_processes: Vec::new(),
        }
    }

    pub fn timestamp_display(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Serialized column values, one per `HEADER` entry.
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.timestamp_display(),
            or_na(self.battery_percent.map(|v| v.to_string())),
            or_na(self.power_watts.map(|v| v.to_string())),
            or_na(self.cpu_util_percent.map(|v| format!("{:.2}", v))),
            or_na(self.cpu_clock.clone()),
            or_na(self.temperature_celsius.map(|v| format!("{:.1}", v))),
            if self.top_processes.is_empty() {
                NOT_AVAILABLE.to_string()
            } else {
                self.top_processes.join(",")
            },
        ]
    }

    /// Parses a row previously produced by `fields`. Returns `None` when the
    /// column count or the timestamp is off.
    pub fn from_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() != HEADER.len() {
            return None;
        }
        let timestamp = DateTime::parse_from_rfc3339(fields[0]).ok()?;
        Some(Self {
            timestamp,
            battery_percent: parse_field(fields[1]),
            power_watts: parse_field(fields[2]),
            cpu_util_percent: parse_field(fields[3]),
            cpu_clock: present(fields[4]).map(str::to_string),
            temperature_celsius: parse_field(fields[5]),
            top_processes: present(fields[6])
                .map(|list| list.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn present(field: &str) -> Option<&str> {
    let field = field.trim();
    if field.is_empty() || field == NOT_AVAILABLE {
        None
    } else {
        Some(field)
    }
}

fn parse_field<T: std::str::FromStr>(field: &str) -> Option<T> {
    present(field).and_then(|f| f.parse().ok())
}
