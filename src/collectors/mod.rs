//! Metric sources: one per instrument, each wrapping exactly one external
//! tool or kernel interface.

use futures::future::BoxFuture;

use crate::config::{CpuClockBackend, CpuLoadBackend, PowerBackend, Settings, TemperatureBackend};
use crate::error::Tool;
use crate::models::{MetricKind, Reading};

pub mod battery;
pub mod command;
pub mod cpu;
pub mod power;
pub mod processes;
pub mod temperature;

/// A capability that reads one raw metric.
///
/// `read` never fails: an instrument that is installed but has nothing to say
/// answers `Reading::Unavailable`. Instruments that are not installed at all
/// are caught up front through `tools`.
pub trait MetricSource: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// External programs this source needs on `PATH`.
    fn tools(&self) -> Vec<Tool> {
        Vec::new()
    }

    fn read(&self) -> BoxFuture<'_, Reading>;
}

/// Builds the sources selected by `settings`, in log column order.
pub fn build_sources(settings: &Settings) -> Vec<Box<dyn MetricSource>> {
    let battery_dir = settings.power_supply_root.join(&settings.battery);

    let power: Box<dyn MetricSource> = match settings.power {
        PowerBackend::Sensors => Box::new(power::SensorsPower),
        PowerBackend::Sysfs => Box::new(power::SysfsPower::new(battery_dir.clone())),
    };
    let cpu_load: Box<dyn MetricSource> = match settings.cpu_load {
        CpuLoadBackend::Mpstat => Box::new(cpu::MpstatLoad::new(settings.cpu_window)),
        CpuLoadBackend::Kernel => Box::new(cpu::KernelLoad::new(settings.cpu_window)),
    };
    let cpu_clock: Box<dyn MetricSource> = match settings.cpu_clock {
        CpuClockBackend::CpufreqInfo => Box::new(cpu::CpufreqClock),
        CpuClockBackend::Kernel => Box::new(cpu::KernelClock::new()),
    };
    let preference = temperature::Preference::new(
        &settings.battery,
        settings.generic_temperature_labels.clone(),
    );
    let temperature: Box<dyn MetricSource> = match settings.temperature {
        TemperatureBackend::Sensors => Box::new(temperature::SensorsTemperature::new(preference)),
        TemperatureBackend::Hwmon => Box::new(temperature::HwmonTemperature::new(
            settings.hwmon_root.clone(),
            preference,
        )),
    };

    vec![
        Box::new(battery::BatterySource::new(battery_dir)),
        power,
        cpu_load,
        cpu_clock,
        temperature,
        Box::new(processes::PsProcesses::new(
            settings.process_count,
            settings.exclude_processes.clone(),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Overrides};

    #[test]
    fn test_default_sources_cover_every_metric_in_order() {
        let settings = AppConfig::default().resolve(&Overrides::default()).unwrap();
        let kinds: Vec<_> = build_sources(&settings).iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, MetricKind::ALL.to_vec());
    }

    #[test]
    fn test_default_sources_need_command_line_tools() {
        let settings = AppConfig::default().resolve(&Overrides::default()).unwrap();
        let mut programs: Vec<_> = build_sources(&settings)
            .iter()
            .flat_map(|s| s.tools())
            .map(|t| t.program)
            .collect();
        programs.sort();
        programs.dedup();
        assert_eq!(programs, vec!["cpufreq-info", "mpstat", "ps", "sensors"]);
    }

    #[test]
    fn test_native_backends_need_only_ps() {
        let mut config = AppConfig::default();
        config.sources.power = "sysfs".into();
        config.sources.cpu_load = "kernel".into();
        config.sources.cpu_clock = "kernel".into();
        config.sources.temperature = "hwmon".into();
        let settings = config.resolve(&Overrides::default()).unwrap();
        let programs: Vec<_> = build_sources(&settings)
            .iter()
            .flat_map(|s| s.tools())
            .map(|t| t.program)
            .collect();
        assert_eq!(programs, vec!["ps"]);
    }
}
