use std::fmt;

pub(crate) mod sample;
pub(crate) mod sensor;

pub use sample::Sample;

/// Marker written in place of any value a source could not provide.
pub const NOT_AVAILABLE: &str = "NA";

/// The instruments sampled every cycle, in log column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Battery,
    Power,
    CpuLoad,
    CpuClock,
    Temperature,
    Processes,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Battery,
        MetricKind::Power,
        MetricKind::CpuLoad,
        MetricKind::CpuClock,
        MetricKind::Temperature,
        MetricKind::Processes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Battery => "battery",
            MetricKind::Power => "power",
            MetricKind::CpuLoad => "cpu_load",
            MetricKind::CpuClock => "cpu_clock",
            MetricKind::Temperature => "temperature",
            MetricKind::Processes => "processes",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw text returned by a metric source, before normalization.
///
/// `Fallback` means the source could not use its preferred instrument for the
/// configured device and answered from a generic one instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Primary(String),
    Fallback(String),
    Unavailable,
}

impl Reading {
    pub fn text(&self) -> Option<&str> {
        match self {
            Reading::Primary(text) | Reading::Fallback(text) => Some(text),
            Reading::Unavailable => None,
        }
    }

    /// Wraps tool output, treating blank text as no data.
    pub fn from_output(text: Option<String>) -> Self {
        match text {
            Some(text) if !text.trim().is_empty() => Reading::Primary(text.trim().to_string()),
            _ => Reading::Unavailable,
        }
    }
}
