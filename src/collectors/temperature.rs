use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;

use crate::collectors::command::run_tool;
use crate::collectors::power::SENSORS;
use crate::collectors::MetricSource;
use crate::error::Tool;
use crate::models::{MetricKind, Reading};
use crate::utils::hwmon;

/// One temperature input: the chip or hwmon device it belongs to, its label
/// and the raw value text.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureInput {
    pub device: String,
    pub label: String,
    pub value: String,
}

fn temperature_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<value>[+-]?\d+(?:[.,]\d+)?\s*°?\s*[CF])(?:\s|$)")
            .expect("temperature pattern is valid")
    })
}

/// Groups the temperature lines of `sensors` output by chip, keeping the
/// order the chips were printed in.
pub fn sensors_chips(output: &str) -> IndexMap<String, Vec<(String, String)>> {
    let mut chips: IndexMap<String, Vec<(String, String)>> = IndexMap::new();
    let mut chip: Option<String> = None;

    for line in output.lines() {
        if line.trim().is_empty() {
            chip = None;
            continue;
        }
        let Some(current) = chip.as_ref() else {
            let name = line.trim().to_string();
            chips.entry(name.clone()).or_default();
            chip = Some(name);
            continue;
        };
        let Some((label, rest)) = line.split_once(':') else {
            continue;
        };
        if label.trim() == "Adapter" {
            continue;
        }
        if let Some(caps) = temperature_value_re().captures(rest.trim_start()) {
            if let Some(readings) = chips.get_mut(current) {
                readings.push((label.trim().to_string(), caps["value"].to_string()));
            }
        }
    }
    chips
}

pub fn sensors_inputs(output: &str) -> Vec<TemperatureInput> {
    sensors_chips(output)
        .into_iter()
        .flat_map(|(device, readings)| {
            readings.into_iter().map(move |(label, value)| TemperatureInput {
                device: device.clone(),
                label,
                value,
            })
        })
        .collect()
}

/// Which input to report: the first one tied to the battery, else the first
/// match for each generic label in priority order.
#[derive(Debug, Clone)]
pub struct Preference {
    device: String,
    generic: Vec<String>,
}

impl Preference {
    pub fn new(device: &str, generic: Vec<String>) -> Self {
        Self {
            device: device.to_lowercase(),
            generic,
        }
    }

    pub fn select(&self, inputs: &[TemperatureInput]) -> Reading {
        if !self.device.is_empty() {
            let own = inputs.iter().find(|input| {
                input.device.to_lowercase().contains(&self.device)
                    || input.label.to_lowercase().contains(&self.device)
            });
            if let Some(input) = own {
                return Reading::Primary(input.value.clone());
            }
        }

        self.generic
            .iter()
            .find_map(|generic| {
                inputs
                    .iter()
                    .find(|input| input.label.eq_ignore_ascii_case(generic))
            })
            .map(|input| Reading::Fallback(input.value.clone()))
            .unwrap_or(Reading::Unavailable)
    }
}

/// Temperature from lm-sensors.
#[derive(Debug, Clone)]
pub struct SensorsTemperature {
    preference: Preference,
}

impl SensorsTemperature {
    pub fn new(preference: Preference) -> Self {
        Self { preference }
    }
}

impl MetricSource for SensorsTemperature {
    fn kind(&self) -> MetricKind {
        MetricKind::Temperature
    }

    fn tools(&self) -> Vec<Tool> {
        vec![SENSORS]
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            match run_tool(SENSORS.program, &[]).await {
                Some(output) => self.preference.select(&sensors_inputs(&output)),
                None => Reading::Unavailable,
            }
        }
        .boxed()
    }
}

/// Temperature straight from the hwmon sysfs tree.
#[derive(Debug, Clone)]
pub struct HwmonTemperature {
    root: PathBuf,
    preference: Preference,
}

impl HwmonTemperature {
    pub fn new(root: PathBuf, preference: Preference) -> Self {
        Self { root, preference }
    }
}

impl MetricSource for HwmonTemperature {
    fn kind(&self) -> MetricKind {
        MetricKind::Temperature
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            let start = Instant::now();
            let inputs: Vec<TemperatureInput> = hwmon::scan(&self.root)
                .into_iter()
                .map(|sensor| TemperatureInput {
                    label: if sensor.label.is_empty() {
                        format!("temp{}", sensor.id)
                    } else {
                        sensor.label
                    },
                    device: sensor.name,
                    value: format!("{:.1}", sensor.temperature),
                })
                .collect();
            let result = self.preference.select(&inputs);
            debug!("hwmon temperature took: {} ms", start.elapsed().as_millis());
            result
        }
        .boxed()
    }
}
