use futures::future::BoxFuture;
use futures::FutureExt;
use log::debug;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;

use crate::collectors::command::run_tool;
use crate::collectors::MetricSource;
use crate::error::Tool;
use crate::models::{MetricKind, Reading};
use crate::utils::hwmon::read_number_from_file;

pub const SENSORS: Tool = Tool {
    program: "sensors",
    package: "lm-sensors",
};

fn power_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*power\d*:\s*(?P<value>[+-]?\d+(?:[.,]\d+)?\s*[µumk]?W)")
            .expect("power pattern is valid")
    })
}

/// Value and unit of the first `powerN:` line of `sensors` output.
pub fn first_power_reading(output: &str) -> Option<String> {
    power_line_re()
        .captures(output)
        .map(|caps| caps["value"].to_string())
}

/// First power reading reported by lm-sensors, in W or mW.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorsPower;

impl MetricSource for SensorsPower {
    fn kind(&self) -> MetricKind {
        MetricKind::Power
    }

    fn tools(&self) -> Vec<Tool> {
        vec![SENSORS]
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            let output = run_tool(SENSORS.program, &[]).await;
            Reading::from_output(output.as_deref().and_then(first_power_reading))
        }
        .boxed()
    }
}

/// Battery power from sysfs: `power_now`, or `current_now * voltage_now` on
/// batteries that only expose those. Both are micro units.
#[derive(Debug, Clone)]
pub struct SysfsPower {
    dir: PathBuf,
}

impl SysfsPower {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn microwatts(&self) -> Option<i64> {
        if let Some(power) = read_number_from_file::<i64>(&self.dir.join("power_now")) {
            return Some(power);
        }
        let current = read_number_from_file::<i64>(&self.dir.join("current_now"))?;
        let voltage = read_number_from_file::<i64>(&self.dir.join("voltage_now"))?;
        Some(current.checked_mul(voltage)? / 1_000_000)
    }
}

impl MetricSource for SysfsPower {
    fn kind(&self) -> MetricKind {
        MetricKind::Power
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            let start = Instant::now();
            let result = match self.microwatts() {
                Some(uw) => Reading::Primary(format!("{uw} uW")),
                None => Reading::Unavailable,
            };
            debug!("sysfs power read took: {} ms", start.elapsed().as_millis());
            result
        }
        .boxed()
    }
}
