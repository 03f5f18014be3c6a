//! Conversion of raw instrument text into the canonical units of a [`Sample`].
//!
//! Every function here is pure and tolerant of decorations: signs, degree
//! symbols, unit suffixes and `,` decimal separators. Anything that does not
//! parse becomes `None`, which the log writes as `NA`.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{MetricKind, Reading, Sample};

fn quantity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<num>[+-]?\d+(?:[.,]\d+)?)\s*(?P<unit>[°µA-Za-z]*)")
            .expect("quantity pattern is valid")
    })
}

/// First number in `text` together with the unit word right after it
/// (lowercased, possibly empty).
fn quantity(text: &str) -> Option<(f64, String)> {
    let caps = quantity_re().captures(text)?;
    let value = caps["num"].replace(',', ".").parse::<f64>().ok()?;
    Some((value, caps["unit"].to_lowercase()))
}

pub fn parse_number(text: &str) -> Option<f64> {
    quantity(text).map(|(value, _)| value)
}

/// Whole battery percentage, clamped to 0..=100.
pub fn battery_percent(text: &str) -> Option<u8> {
    parse_number(text).map(|v| v.round().clamp(0.0, 100.0) as u8)
}

/// Power in watts. Unitless values are already watts.
pub fn power_watts(text: &str) -> Option<f64> {
    let (value, unit) = quantity(text)?;
    let watts = match unit.as_str() {
        "" | "w" => value,
        "mw" => value / 1000.0,
        "uw" | "µw" => value / 1_000_000.0,
        "kw" => value * 1000.0,
        _ => return None,
    };
    Some(watts.abs())
}

/// CPU utilisation from an idle percentage.
pub fn cpu_util_from_idle(text: &str) -> Option<f64> {
    parse_number(text).map(|idle| (100.0 - idle).clamp(0.0, 100.0))
}

/// Canonical whole-MHz clock text. Unitless values are taken as MHz.
pub fn cpu_clock(text: &str) -> Option<String> {
    let (value, unit) = quantity(text)?;
    let mhz = match unit.as_str() {
        "" | "mhz" => value,
        "ghz" => value * 1000.0,
        "khz" => value / 1000.0,
        "hz" => value / 1_000_000.0,
        _ => return None,
    };
    Some(format!("{:.0} MHz", mhz))
}

/// Temperature in Celsius. Fahrenheit readings are converted.
pub fn temperature_celsius(text: &str) -> Option<f64> {
    let (value, unit) = quantity(text)?;
    match unit.trim_start_matches('°') {
        "" | "c" => Some(value),
        "f" => Some((value - 32.0) * 5.0 / 9.0),
        _ => None,
    }
}

/// Splits a comma or newline separated process list. `;` is the log
/// delimiter, so it is replaced inside names.
pub fn process_names(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.replace(';', "_"))
        .collect()
}

/// Folds one source reading into the sample field for `kind`.
pub fn apply(kind: MetricKind, reading: &Reading, sample: &mut Sample) {
    let Some(text) = reading.text() else {
        return;
    };
    match kind {
        MetricKind::Battery => sample.battery_percent = battery_percent(text),
        MetricKind::Power => sample.power_watts = power_watts(text),
        MetricKind::CpuLoad => sample.cpu_util_percent = cpu_util_from_idle(text),
        MetricKind::CpuClock => sample.cpu_clock = cpu_clock(text),
        MetricKind::Temperature => sample.temperature_celsius = temperature_celsius(text),
        MetricKind::Processes => sample.top_processes = process_names(text),
    }
}
